//! Node inspector: edits the selected node's `data`.
//!
//! The field set is a dispatch over [`ServiceConfig`]; unknown service
//! tags fall back to a freeform description. Explicit submit and the
//! 300 ms debounced auto-save funnel through the same `UpdateNodeData`
//! message, and any pending debounce is cancelled whenever the panel is
//! rebuilt (selection change, close, mode switch).

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event};

use super::escape;
use crate::messages::Message;
use crate::models::{NodeDataPatch, Params, ServiceConfig};
use crate::state::{dispatch, AppContext};
use crate::toast;

const CONTAINER_ID: &str = "config-panel-container";

/// Raw field values as read from the form. Assembled into a patch by
/// [`patch_from_fields`], which is where the service dispatch lives.
#[derive(Clone, Debug, Default)]
pub struct FieldValues {
    pub service: String,
    pub label: String,
    pub task: String,
    pub phone: String,
    pub message: String,
    pub amount: String,
    pub currency: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub payment_description: String,
    pub spreadsheet_id: String,
    pub range: String,
    pub row_data: String,
    pub generic_description: String,
}

/// Builds the full partial-update for the current form contents. Every
/// write path (debounce or submit) goes through this one function.
pub fn patch_from_fields(fields: &FieldValues) -> NodeDataPatch {
    let mut patch = NodeDataPatch {
        service: Some(fields.service.clone()),
        label: Some(fields.label.clone()),
        task: Some(fields.task.clone()),
        ..Default::default()
    };

    let mut params = Params::new();
    let mut put = |key: &str, value: &str| {
        params.insert(key.to_string(), serde_json::Value::String(value.to_string()));
    };

    match fields.service.as_str() {
        ServiceConfig::WHATSAPP => {
            put("phone", &fields.phone);
            put("message", &fields.message);
            patch.params = Some(params);
        }
        ServiceConfig::RAZORPAY => {
            put("amount", &fields.amount);
            put("currency", &fields.currency);
            put("customer_name", &fields.customer_name);
            put("customer_email", &fields.customer_email);
            put("customer_phone", &fields.customer_phone);
            put("description", &fields.payment_description);
            patch.params = Some(params);
        }
        ServiceConfig::GOOGLE_SHEETS => {
            put("spreadsheet_id", &fields.spreadsheet_id);
            put("range", &fields.range);
            put("row_data", &fields.row_data);
            patch.params = Some(params);
        }
        _ => {
            patch.description = Some(fields.generic_description.clone());
        }
    }
    patch
}

/// Recipient numbers must be 7-15 digits (optional leading `+`), unless
/// the field is a `{{trigger_data.*}}` template to be resolved at run
/// time.
pub fn phone_is_valid(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.contains("{{") {
        return true;
    }
    let digits = value.strip_prefix('+').unwrap_or(value);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// Rebuilds the panel for the current selection. Always cancels the
/// pending debounced write first so nothing is attributed to a previously
/// selected node.
pub fn refresh(ctx: &AppContext) {
    ctx.panel_debounce.borrow_mut().cancel();

    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let Some(container) = document.get_element_by_id(CONTAINER_ID) else {
        return;
    };

    let selected = {
        let store = ctx.store.borrow();
        if store.monitor_mode {
            None
        } else {
            store.selected_node().cloned()
        }
    };

    let Some(node) = selected else {
        container.set_inner_html("");
        let _ = container.set_attribute("style", "display: none;");
        return;
    };
    let _ = container.remove_attribute("style");

    container.set_inner_html(&render_form(&node.data.service, &node));
    wire_events(ctx, &document, &container, node.id.clone());
}

fn render_form(service: &str, node: &crate::models::WorkflowNode) -> String {
    let data = &node.data;
    let config = ServiceConfig::from_data(data);

    let mut html = String::new();
    html.push_str(
        "<div class=\"panel-header\"><h3>Configure Node</h3>\
         <button id=\"cfg-close\" class=\"panel-close\" title=\"Close\">×</button></div>",
    );
    html.push_str("<div class=\"panel-body\">");

    // Service selector.
    html.push_str("<label>Service Type</label><select id=\"cfg-service\">");
    for (tag, title) in [
        (ServiceConfig::WHATSAPP, "WhatsApp"),
        (ServiceConfig::RAZORPAY, "Razorpay"),
        (ServiceConfig::GOOGLE_SHEETS, "Google Sheets"),
        ("other", "Other"),
    ] {
        let selected = if tag == service
            || (tag == "other" && ServiceConfig::task_options(service).is_empty())
        {
            " selected"
        } else {
            ""
        };
        html.push_str(&format!("<option value=\"{tag}\"{selected}>{title}</option>"));
    }
    html.push_str("</select>");

    html.push_str(&text_input("cfg-label", "Node Label", data.label.as_deref().unwrap_or(""), "Enter node name..."));

    // Task selector, driven by the service tag.
    let tasks = ServiceConfig::task_options(service);
    if !tasks.is_empty() {
        html.push_str("<label>Task</label><select id=\"cfg-task\">");
        let current = data.task.as_deref().unwrap_or("");
        for task in tasks {
            let selected = if *task == current { " selected" } else { "" };
            html.push_str(&format!("<option value=\"{task}\"{selected}>{task}</option>"));
        }
        html.push_str("</select>");
    }

    match config {
        ServiceConfig::WhatsApp(p) => {
            html.push_str(&text_input(
                "cfg-phone",
                "Phone Number",
                p.phone.as_deref().unwrap_or(""),
                "+1234567890",
            ));
            html.push_str("<p id=\"cfg-phone-error\" class=\"field-error\"></p>");
            html.push_str(&text_area(
                "cfg-message",
                "Message Body",
                p.message.as_deref().unwrap_or(""),
                "Hello, {{trigger_data.name}}!",
            ));
            html.push_str(
                "<p class=\"field-hint\">Use <code>{{trigger_data.field}}</code> \
                 to map data from previous steps.</p>",
            );
        }
        ServiceConfig::Razorpay(p) => {
            html.push_str(&text_input("cfg-amount", "Amount (₹)", p.amount.as_deref().unwrap_or(""), "1000"));
            html.push_str("<label>Currency</label><select id=\"cfg-currency\">");
            let currency = p.currency.as_deref().unwrap_or("INR");
            for option in ["INR", "USD"] {
                let selected = if option == currency { " selected" } else { "" };
                html.push_str(&format!("<option value=\"{option}\"{selected}>{option}</option>"));
            }
            html.push_str("</select>");
            html.push_str(&text_input(
                "cfg-customer-name",
                "Customer Name",
                p.customer_name.as_deref().unwrap_or(""),
                "{{trigger_data.customer_name}}",
            ));
            html.push_str(&text_input(
                "cfg-customer-email",
                "Customer Email",
                p.customer_email.as_deref().unwrap_or(""),
                "{{trigger_data.customer_email}}",
            ));
            html.push_str(&text_input(
                "cfg-customer-phone",
                "Customer Phone",
                p.customer_phone.as_deref().unwrap_or(""),
                "{{trigger_data.customer_phone}}",
            ));
            html.push_str(&text_input(
                "cfg-description",
                "Description",
                p.description.as_deref().unwrap_or(""),
                "Payment for order {{trigger_data.order_id}}",
            ));
        }
        ServiceConfig::GoogleSheets(p) => {
            html.push_str(&text_input(
                "cfg-sheet-id",
                "Spreadsheet ID",
                p.spreadsheet_id.as_deref().unwrap_or(""),
                "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms",
            ));
            html.push_str(&text_input("cfg-range", "Range", p.range.as_deref().unwrap_or(""), "A1:C10"));
            html.push_str(&text_area(
                "cfg-row-data",
                "Values (JSON)",
                p.row_data.as_deref().unwrap_or(""),
                "[[\"Name\", \"Email\"]]",
            ));
        }
        ServiceConfig::Generic { description } => {
            html.push_str(&text_area(
                "cfg-generic-description",
                "Description",
                description.as_deref().unwrap_or(""),
                "Describe what this node does...",
            ));
        }
    }

    html.push_str("</div>");
    html.push_str(
        "<div class=\"panel-footer\">\
         <button id=\"cfg-save\" class=\"btn-primary\">Save Configuration</button></div>",
    );
    html
}

fn text_input(id: &str, label: &str, value: &str, placeholder: &str) -> String {
    format!(
        "<label for=\"{id}\">{label}</label>\
         <input id=\"{id}\" value=\"{}\" placeholder=\"{}\">",
        escape(value),
        escape(placeholder)
    )
}

fn text_area(id: &str, label: &str, value: &str, placeholder: &str) -> String {
    format!(
        "<label for=\"{id}\">{label}</label>\
         <textarea id=\"{id}\" rows=\"4\" placeholder=\"{}\">{}</textarea>",
        escape(placeholder),
        escape(value)
    )
}

fn wire_events(ctx: &AppContext, document: &Document, container: &Element, node_id: String) {
    // Close button deselects, which closes the panel via refresh.
    if let Some(close) = document.get_element_by_id("cfg-close") {
        let ctx_close = ctx.clone();
        let handler = Closure::wrap(Box::new(move |_: Event| {
            dispatch(&ctx_close, Message::SelectNode(None));
        }) as Box<dyn FnMut(_)>);
        let _ = close.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
        handler.forget();
    }

    // One delegated listener per event type. Each edit cancels the pending
    // timer and arms a new one that reads the form at fire time, so the
    // final write always carries the last full field values.
    for event_name in ["input", "change"] {
        let ctx_edit = ctx.clone();
        let node_id_edit = node_id.clone();
        let handler = Closure::wrap(Box::new(move |event: Event| {
            let target_id = event
                .target()
                .and_then(|t| t.dyn_into::<Element>().ok())
                .map(|el| el.id())
                .unwrap_or_default();

            if target_id == "cfg-service" {
                // Service switches rebuild the field set immediately.
                ctx_edit.panel_debounce.borrow_mut().cancel();
                if let Some(fields) = read_fields() {
                    dispatch(
                        &ctx_edit,
                        Message::UpdateNodeData {
                            node_id: node_id_edit.clone(),
                            patch: patch_from_fields(&fields),
                        },
                    );
                }
                refresh(&ctx_edit);
                return;
            }

            let ctx_fire = ctx_edit.clone();
            let node_id_fire = node_id_edit.clone();
            ctx_edit.panel_debounce.borrow_mut().schedule(move || {
                let Some(fields) = read_fields() else {
                    return;
                };
                show_phone_error(&fields);
                dispatch(
                    &ctx_fire,
                    Message::UpdateNodeData {
                        node_id: node_id_fire,
                        patch: patch_from_fields(&fields),
                    },
                );
            });
        }) as Box<dyn FnMut(_)>);
        let _ = container
            .add_event_listener_with_callback(event_name, handler.as_ref().unchecked_ref());
        handler.forget();
    }

    // Explicit submit: validation gates it, then it funnels through the
    // very same UpdateNodeData message.
    if let Some(save) = document.get_element_by_id("cfg-save") {
        let ctx_save = ctx.clone();
        let handler = Closure::wrap(Box::new(move |_: Event| {
            let Some(fields) = read_fields() else {
                return;
            };
            if !show_phone_error(&fields) {
                return;
            }
            ctx_save.panel_debounce.borrow_mut().cancel();
            dispatch(
                &ctx_save,
                Message::UpdateNodeData {
                    node_id: node_id.clone(),
                    patch: patch_from_fields(&fields),
                },
            );
            toast::success("Configuration saved!");
        }) as Box<dyn FnMut(_)>);
        let _ = save.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
        handler.forget();
    }
}

/// Reads the current form contents. Returns None when the panel is gone.
fn read_fields() -> Option<FieldValues> {
    let document = web_sys::window()?.document()?;
    let value = |id: &str| -> String { field_value(&document, id).unwrap_or_default() };

    let service = field_value(&document, "cfg-service")?;
    Some(FieldValues {
        service,
        label: value("cfg-label"),
        task: value("cfg-task"),
        phone: value("cfg-phone"),
        message: value("cfg-message"),
        amount: value("cfg-amount"),
        currency: value("cfg-currency"),
        customer_name: value("cfg-customer-name"),
        customer_email: value("cfg-customer-email"),
        customer_phone: value("cfg-customer-phone"),
        payment_description: value("cfg-description"),
        spreadsheet_id: value("cfg-sheet-id"),
        range: value("cfg-range"),
        row_data: value("cfg-row-data"),
        generic_description: value("cfg-generic-description"),
    })
}

fn field_value(document: &Document, id: &str) -> Option<String> {
    let element = document.get_element_by_id(id)?;
    if let Some(input) = element.dyn_ref::<web_sys::HtmlInputElement>() {
        return Some(input.value());
    }
    if let Some(area) = element.dyn_ref::<web_sys::HtmlTextAreaElement>() {
        return Some(area.value());
    }
    if let Some(select) = element.dyn_ref::<web_sys::HtmlSelectElement>() {
        return Some(select.value());
    }
    None
}

/// Updates the inline phone error. Returns whether the form is valid.
fn show_phone_error(fields: &FieldValues) -> bool {
    let valid = fields.service != ServiceConfig::WHATSAPP || phone_is_valid(&fields.phone);
    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
        if let Some(el) = document.get_element_by_id("cfg-phone-error") {
            el.set_text_content(if valid {
                None
            } else {
                Some("Enter 7-15 digits, with an optional leading +")
            });
        }
    }
    valid
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_validation_counts_digits() {
        assert!(phone_is_valid(""));
        assert!(phone_is_valid("+911234567890"));
        assert!(phone_is_valid("1234567"));
        assert!(phone_is_valid("{{trigger_data.customer_phone}}"));
        assert!(!phone_is_valid("12345"));
        assert!(!phone_is_valid("+12-345-678"));
        assert!(!phone_is_valid("1234567890123456"));
    }

    #[test]
    fn patch_carries_only_the_active_service_params() {
        let fields = FieldValues {
            service: ServiceConfig::WHATSAPP.to_string(),
            label: "Notify".to_string(),
            task: "send_message".to_string(),
            phone: "+911234567890".to_string(),
            message: "Hi {{trigger_data.name}}".to_string(),
            // Stale values from a previous service must not leak through.
            amount: "999".to_string(),
            ..Default::default()
        };
        let patch = patch_from_fields(&fields);
        let params = patch.params.expect("whatsapp params");
        assert_eq!(params.len(), 2);
        assert_eq!(params["phone"], "+911234567890");
        assert!(patch.description.is_none());
    }

    #[test]
    fn unknown_service_falls_back_to_description() {
        let fields = FieldValues {
            service: "other".to_string(),
            generic_description: "calls a custom webhook".to_string(),
            ..Default::default()
        };
        let patch = patch_from_fields(&fields);
        assert!(patch.params.is_none());
        assert_eq!(patch.description.as_deref(), Some("calls a custom webhook"));
    }
}
