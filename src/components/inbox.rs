//! Omni-channel inbox: session list, live message feed and the report
//! export strip.
//!
//! Messages for the open session arrive over the same push feed as run
//! monitoring: the watcher subscribes to `realtime-messages-{session_id}`
//! and re-fetches the list on every insert event. Switching sessions
//! swaps the channel with the same teardown-before-open rule as the run
//! monitor.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event};

use super::escape;
use crate::messages::{ExportKind, Message};
use crate::network::realtime::ChannelRouter;
use crate::state::{dispatch, AppContext};

const CONTAINER_ID: &str = "inbox-view";

pub fn session_topic(session_id: &str) -> String {
    format!("realtime-messages-{session_id}")
}

/// Subscribes to the session's message feed and hands ownership of the
/// channel to the store (which cancels the previous one first).
pub fn watch_session(ctx: &AppContext, session_id: &str) {
    let ctx_events = ctx.clone();
    let session = session_id.to_string();
    let guard = ChannelRouter::subscribe(&ctx.router, &session_topic(session_id), move |frame| {
        let is_insert = frame
            .get("event")
            .and_then(|e| e.as_str())
            .map_or(false, |e| e.eq_ignore_ascii_case("insert"));
        if is_insert {
            dispatch(
                &ctx_events,
                Message::InboxMessageArrived {
                    session_id: session.clone(),
                },
            );
        }
    });
    ctx.store.borrow_mut().install_inbox_channel(guard);
}

pub fn refresh(ctx: &AppContext) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(container) = document.get_element_by_id(CONTAINER_ID) else {
        return;
    };

    container.set_inner_html(&render(ctx));
    wire_events(ctx, &document);
}

fn render(ctx: &AppContext) -> String {
    let store = ctx.store.borrow();
    let mut html = String::new();

    // Reports strip.
    html.push_str("<div class=\"reports-strip\"><label>Reports</label>");
    for (kind, title) in [
        (ExportKind::Inventory, "Inventory (Excel)"),
        (ExportKind::OverallLedgerPdf, "Ledger (PDF)"),
        (ExportKind::OverallLedgerExcel, "Ledger (Excel)"),
        (ExportKind::AgingDebtors, "Aging Debtors"),
    ] {
        let busy = store.pending.downloading.contains(&kind.key());
        html.push_str(&format!(
            "<button id=\"exp-{}\" class=\"btn-mini\"{}>{}</button>",
            slug(&kind),
            if busy { " disabled" } else { "" },
            if busy {
                "<span class=\"spinner\"></span>".to_string()
            } else {
                title.to_string()
            },
        ));
    }
    html.push_str("</div>");

    // Session list.
    html.push_str("<div class=\"inbox-layout\"><ul class=\"session-list\">");
    if store.inbox_sessions.is_empty() {
        html.push_str("<li class=\"field-hint\">No conversations found</li>");
    }
    for session in &store.inbox_sessions {
        let selected = store.selected_session_id.as_deref() == Some(session.id.as_str());
        html.push_str(&format!(
            "<li><button id=\"session-{id}\" class=\"session-button{sel}\">\
             <span class=\"session-name\">{name}</span>\
             <span class=\"session-platform\">{platform}</span>\
             <span class=\"session-preview\">{preview}</span></button></li>",
            id = session.id,
            sel = if selected { " active" } else { "" },
            name = escape(session.customer_name.as_deref().unwrap_or("Unknown")),
            platform = escape(session.platform.as_deref().unwrap_or("")),
            preview = escape(session.last_message.as_deref().unwrap_or("")),
        ));
    }
    html.push_str("</ul>");

    // Message pane for the open session.
    html.push_str("<div class=\"message-pane\">");
    if store.selected_session_id.is_none() {
        html.push_str("<p class=\"field-hint\">Select a conversation</p>");
    } else if store.inbox_messages.is_empty() {
        html.push_str("<p class=\"field-hint\">No messages yet</p>");
    } else {
        for message in &store.inbox_messages {
            let mine = message.sender.as_deref() == Some("business");
            html.push_str(&format!(
                "<div class=\"bubble {}\">{}</div>",
                if mine { "bubble-out" } else { "bubble-in" },
                escape(&message.content),
            ));

            // Drafted invoices arrive as regular messages plus an id; they
            // render as an actionable card under the bubble.
            if let Some(invoice_id) = &message.invoice_id {
                let busy = store.pending.invoice_actions.contains(invoice_id);
                html.push_str(&format!(
                    "<div class=\"invoice-card\">\
                     <span>Invoice draft #{inv}</span>\
                     <button id=\"inv-ok-{inv}\" class=\"btn-mini\"{dis}>{ok}</button>\
                     <button id=\"inv-del-{inv}\" class=\"btn-mini btn-danger\"{dis}>{del}</button>\
                     </div>",
                    inv = escape(invoice_id),
                    dis = if busy { " disabled" } else { "" },
                    ok = if busy { "…" } else { "Confirm" },
                    del = if busy { "…" } else { "Delete" },
                ));
            }
        }
    }
    html.push_str("</div></div>");

    html
}

fn slug(kind: &ExportKind) -> &'static str {
    match kind {
        ExportKind::Inventory => "inventory",
        ExportKind::OverallLedgerPdf => "ledger-pdf",
        ExportKind::OverallLedgerExcel => "ledger-xlsx",
        ExportKind::AgingDebtors => "debtors",
        ExportKind::InvoicePdf(_) | ExportKind::InvoiceExcel(_) => "invoice",
    }
}

fn wire_events(ctx: &AppContext, document: &Document) {
    let session_ids: Vec<String> = ctx
        .store
        .borrow()
        .inbox_sessions
        .iter()
        .map(|s| s.id.clone())
        .collect();
    for id in session_ids {
        let element_id = format!("session-{id}");
        let session_id = id.clone();
        on_click(ctx, document, &element_id, move |ctx| {
            dispatch(
                ctx,
                Message::SelectInboxSession {
                    session_id: session_id.clone(),
                },
            );
        });
    }

    for (kind, element_id) in [
        (ExportKind::Inventory, "exp-inventory"),
        (ExportKind::OverallLedgerPdf, "exp-ledger-pdf"),
        (ExportKind::OverallLedgerExcel, "exp-ledger-xlsx"),
        (ExportKind::AgingDebtors, "exp-debtors"),
    ] {
        on_click(ctx, document, element_id, move |ctx| {
            dispatch(ctx, Message::DownloadExport { kind: kind.clone() });
        });
    }

    let invoice_ids: Vec<String> = ctx
        .store
        .borrow()
        .inbox_messages
        .iter()
        .filter_map(|m| m.invoice_id.clone())
        .collect();
    for invoice_id in invoice_ids {
        let confirm = invoice_id.clone();
        on_click(ctx, document, &format!("inv-ok-{invoice_id}"), move |ctx| {
            dispatch(
                ctx,
                Message::ConfirmInvoice {
                    invoice_id: confirm.clone(),
                },
            );
        });
        let delete = invoice_id.clone();
        on_click(ctx, document, &format!("inv-del-{invoice_id}"), move |ctx| {
            dispatch(
                ctx,
                Message::DeleteInvoice {
                    invoice_id: delete.clone(),
                },
            );
        });
    }
}

fn on_click<F>(ctx: &AppContext, document: &Document, id: &str, action: F)
where
    F: Fn(&AppContext) + 'static,
{
    let Some(element) = document.get_element_by_id(id) else {
        return;
    };
    let ctx = ctx.clone();
    let handler = Closure::wrap(Box::new(move |_: Event| {
        action(&ctx);
    }) as Box<dyn FnMut(_)>);
    let _ = element.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
    handler.forget();
}
