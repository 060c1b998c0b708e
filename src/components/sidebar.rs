//! Builder sidebar: AI prompt, saved-workflow list and run controls.

use chrono::DateTime;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event};

use super::escape;
use crate::messages::Message;
use crate::state::{dispatch, AppContext};

const CONTAINER_ID: &str = "sidebar-container";

/// Rebuilds the sidebar from the current store snapshot. Text the user is
/// mid-typing (prompt, workflow name) survives the rebuild.
pub fn refresh(ctx: &AppContext) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(container) = document.get_element_by_id(CONTAINER_ID) else {
        return;
    };

    let kept_prompt = field_value(&document, "wf-prompt");
    let kept_name = field_value(&document, "wf-name");

    container.set_inner_html(&render(ctx));

    if let Some(prompt) = kept_prompt {
        set_field_value(&document, "wf-prompt", &prompt);
    }
    if let Some(name) = kept_name {
        set_field_value(&document, "wf-name", &name);
    }

    wire_events(ctx, &document);
    update_empty_state(ctx, &document);
}

fn render(ctx: &AppContext) -> String {
    let store = ctx.store.borrow();
    let mut html = String::new();

    // Prompt-to-draft section.
    html.push_str("<div class=\"sidebar-section\">");
    html.push_str("<label>AI Workflow Prompt</label>");
    html.push_str(
        "<textarea id=\"wf-prompt\" rows=\"5\" placeholder=\"Describe your workflow... e.g. \
         'When a new order comes in, send a WhatsApp message to the customer'\"></textarea>",
    );
    if store.pending.generating {
        html.push_str(
            "<button id=\"wf-generate\" class=\"btn-primary\" disabled>\
             <span class=\"spinner\"></span> Generating...</button>",
        );
    } else {
        html.push_str("<button id=\"wf-generate\" class=\"btn-primary\">✨ Generate Workflow</button>");
    }
    html.push_str("</div>");

    // Save section.
    html.push_str("<div class=\"sidebar-section\">");
    html.push_str("<label>Workflow Name</label>");
    html.push_str("<input id=\"wf-name\" placeholder=\"My workflow\">");
    if store.pending.saving {
        html.push_str(
            "<button id=\"wf-save\" class=\"btn-secondary\" disabled>\
             <span class=\"spinner\"></span> Saving...</button>",
        );
    } else {
        html.push_str("<button id=\"wf-save\" class=\"btn-secondary\">Save Workflow</button>");
    }
    html.push_str("</div>");

    // Canvas / run controls.
    html.push_str("<div class=\"sidebar-section sidebar-controls\">");
    html.push_str("<button id=\"wf-layout\" class=\"btn-secondary\">Auto Layout</button>");
    if store.monitor_mode {
        html.push_str("<button id=\"wf-mode\" class=\"btn-mode-active\">📊 Monitor Mode</button>");
        if store.pending.executing {
            html.push_str(
                "<button id=\"wf-execute\" class=\"btn-run\" disabled>⏳ Running...</button>",
            );
        } else {
            html.push_str("<button id=\"wf-execute\" class=\"btn-run\">▶ Start Workflow</button>");
        }
        html.push_str("<p class=\"field-hint\">Live monitoring enabled • Updates in realtime</p>");
    } else {
        html.push_str("<button id=\"wf-mode\" class=\"btn-secondary\">✏ Edit Mode</button>");
    }
    html.push_str("</div>");

    // Saved workflows.
    html.push_str("<div class=\"sidebar-section\"><label>Saved Workflows</label>");
    if store.pending.loading_workflows {
        html.push_str("<p class=\"field-hint\">Loading…</p>");
    } else if store.workflows.is_empty() {
        html.push_str("<p class=\"field-hint\">No saved workflows yet</p>");
    } else {
        html.push_str("<ul class=\"workflow-list\">");
        for workflow in &store.workflows {
            let deleting = store.pending.deleting.contains(&workflow.id);
            html.push_str(&format!(
                "<li><div class=\"workflow-meta\"><span class=\"workflow-name\">{}</span>\
                 <span class=\"workflow-date\">{}</span></div>\
                 <button id=\"open-{id}\" class=\"btn-mini\">Open</button>\
                 <button id=\"del-{id}\" class=\"btn-mini btn-danger\"{disabled}>{del}</button></li>",
                escape(&workflow.name),
                format_created(workflow.created_at.as_deref()),
                id = workflow.id,
                disabled = if deleting { " disabled" } else { "" },
                del = if deleting { "…" } else { "Delete" },
            ));
        }
        html.push_str("</ul>");
    }
    html.push_str("</div>");

    html
}

fn format_created(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => ts.format("%d %b %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn wire_events(ctx: &AppContext, document: &Document) {
    on_click(ctx, document, "wf-generate", |ctx, document| {
        let prompt = field_value(document, "wf-prompt").unwrap_or_default();
        dispatch(ctx, Message::GenerateWorkflow { prompt });
    });
    on_click(ctx, document, "wf-save", |ctx, document| {
        let name = field_value(document, "wf-name").unwrap_or_default();
        dispatch(ctx, Message::SaveWorkflow { name });
    });
    on_click(ctx, document, "wf-layout", |ctx, _| {
        dispatch(ctx, Message::ApplyAutoLayout);
    });
    on_click(ctx, document, "wf-mode", |ctx, _| {
        let enabled = !ctx.store.borrow().monitor_mode;
        dispatch(ctx, Message::SetMonitorMode(enabled));
    });
    on_click(ctx, document, "wf-execute", |ctx, _| {
        dispatch(ctx, Message::ExecuteWorkflow);
    });

    let workflow_ids: Vec<String> = ctx
        .store
        .borrow()
        .workflows
        .iter()
        .map(|w| w.id.clone())
        .collect();
    for id in workflow_ids {
        let open_id = format!("open-{id}");
        let workflow_id = id.clone();
        on_click(ctx, document, &open_id, move |ctx, _| {
            dispatch(
                ctx,
                Message::OpenWorkflow {
                    workflow_id: workflow_id.clone(),
                },
            );
        });

        let del_id = format!("del-{id}");
        let workflow_id = id.clone();
        on_click(ctx, document, &del_id, move |ctx, _| {
            dispatch(
                ctx,
                Message::DeleteWorkflow {
                    workflow_id: workflow_id.clone(),
                },
            );
        });
    }
}

fn update_empty_state(ctx: &AppContext, document: &Document) {
    if let Some(overlay) = document.get_element_by_id("canvas-empty-state") {
        let empty = ctx.store.borrow().nodes.is_empty();
        let style = if empty { "" } else { "display: none;" };
        let _ = overlay.set_attribute("style", style);
    }
}

fn on_click<F>(ctx: &AppContext, document: &Document, id: &str, action: F)
where
    F: Fn(&AppContext, &Document) + 'static,
{
    let Some(element) = document.get_element_by_id(id) else {
        return;
    };
    let ctx = ctx.clone();
    let document = document.clone();
    let handler = Closure::wrap(Box::new(move |_: Event| {
        action(&ctx, &document);
    }) as Box<dyn FnMut(_)>);
    let _ = element.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
    handler.forget();
}

fn field_value(document: &Document, id: &str) -> Option<String> {
    let element = document.get_element_by_id(id)?;
    if let Some(input) = element.dyn_ref::<web_sys::HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(area) = element.dyn_ref::<web_sys::HtmlTextAreaElement>() {
        return Some(area.value());
    }
    None
}

fn set_field_value(document: &Document, id: &str, value: &str) {
    let Some(element) = document.get_element_by_id(id) else {
        return;
    };
    if let Some(input) = element.dyn_ref::<web_sys::HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(area) = element.dyn_ref::<web_sys::HtmlTextAreaElement>() {
        area.set_value(value);
    }
}
