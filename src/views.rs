//! Page skeleton and top-level view switching.

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::Document;

use crate::messages::Message;
use crate::state::{dispatch, AppContext};
use crate::storage::ActiveView;

/// Builds the static page layout once at startup: header with tab
/// navigation, the builder view (sidebar + canvas + inspector) and the
/// inbox view.
pub fn setup_page(ctx: &AppContext, document: &Document) -> Result<(), JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;

    body.set_inner_html(
        "<header id=\"app-header\">\
           <h1>BizFlow</h1>\
           <nav id=\"tabs\">\
             <button id=\"tab-workflows\" class=\"tab-button\">Workflows</button>\
             <button id=\"tab-inbox\" class=\"tab-button\">Inbox</button>\
           </nav>\
         </header>\
         <main id=\"app-main\">\
           <div id=\"builder-view\">\
             <aside id=\"sidebar-container\"></aside>\
             <div id=\"canvas-container\">\
               <canvas id=\"workflow-canvas\"></canvas>\
               <div id=\"canvas-empty-state\">\
                 <p class=\"empty-title\">Canvas is empty</p>\
                 <p class=\"empty-hint\">Generate a workflow using AI in the sidebar</p>\
               </div>\
             </div>\
             <aside id=\"config-panel-container\" style=\"display: none;\"></aside>\
           </div>\
           <div id=\"inbox-view\" style=\"display: none;\"></div>\
         </main>",
    );

    ensure_styles(document)?;

    for (id, view) in [
        ("tab-workflows", ActiveView::Workflows),
        ("tab-inbox", ActiveView::Inbox),
    ] {
        let Some(tab) = document.get_element_by_id(id) else {
            continue;
        };
        let ctx = ctx.clone();
        let handler = Closure::wrap(Box::new(move |_: web_sys::MouseEvent| {
            dispatch(&ctx, Message::ToggleView(view));
        }) as Box<dyn FnMut(_)>);
        tab.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref())?;
        handler.forget();
    }

    Ok(())
}

/// Shows the container for the active view and hides the other.
pub fn render_active_view(ctx: &AppContext) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let active = ctx.store.borrow().active_view;

    let set_visible = |id: &str, visible: bool| {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("style", if visible { "" } else { "display: none;" });
        }
    };
    set_visible("builder-view", active == ActiveView::Workflows);
    set_visible("inbox-view", active == ActiveView::Inbox);

    let set_tab = |id: &str, on: bool| {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_class_name(if on { "tab-button active" } else { "tab-button" });
        }
    };
    set_tab("tab-workflows", active == ActiveView::Workflows);
    set_tab("tab-inbox", active == ActiveView::Inbox);
}

fn ensure_styles(document: &Document) -> Result<(), JsValue> {
    if document.get_element_by_id("app-styles").is_some() {
        return Ok(());
    }

    let css = "
html,body{margin:0;height:100%;background:#030014;color:#e5e7eb;font-family:system-ui,-apple-system,sans-serif}
#app-header{display:flex;align-items:center;gap:24px;padding:10px 20px;border-bottom:1px solid rgba(255,255,255,.08)}
#app-header h1{font-size:16px;margin:0}
.tab-button{background:none;border:none;color:#9ca3af;padding:8px 12px;cursor:pointer;font-size:13px;border-bottom:2px solid transparent}
.tab-button.active{color:#fff;border-bottom-color:#6366f1}
#app-main{height:calc(100% - 49px)}
#builder-view{display:flex;height:100%}
#sidebar-container{width:300px;border-right:1px solid rgba(255,255,255,.08);padding:16px;overflow-y:auto;background:#050510}
#canvas-container{flex:1;position:relative}
#workflow-canvas{display:block}
#canvas-empty-state{position:absolute;inset:0;display:flex;flex-direction:column;align-items:center;justify-content:center;pointer-events:none;color:#6b7280}
.empty-title{font-size:17px;font-weight:600;margin:0}
.empty-hint{font-size:13px;opacity:.6}
#config-panel-container{width:320px;border-left:1px solid rgba(255,255,255,.08);background:rgba(15,16,22,.95);display:flex;flex-direction:column;overflow-y:auto}
.panel-header{display:flex;justify-content:space-between;align-items:center;padding:14px 16px;border-bottom:1px solid rgba(255,255,255,.08)}
.panel-header h3{margin:0;font-size:13px}
.panel-close{background:none;border:none;color:#9ca3af;font-size:16px;cursor:pointer}
.panel-body{padding:16px;display:flex;flex-direction:column;gap:6px}
.panel-footer{padding:16px;border-top:1px solid rgba(255,255,255,.08)}
label{font-size:10px;letter-spacing:.08em;text-transform:uppercase;color:#9ca3af;margin-top:8px}
input,textarea,select{background:rgba(0,0,0,.4);border:1px solid rgba(255,255,255,.1);border-radius:8px;padding:8px 10px;font-size:13px;color:#fff;width:100%;box-sizing:border-box}
textarea{resize:none;font-family:inherit}
button{cursor:pointer}
.btn-primary{width:100%;padding:10px;border:none;border-radius:10px;background:#fff;color:#000;font-weight:700;margin-top:8px}
.btn-primary:disabled{background:rgba(255,255,255,.1);color:#6b7280;cursor:not-allowed}
.btn-secondary{width:100%;padding:9px;border:1px solid rgba(255,255,255,.15);border-radius:10px;background:rgba(255,255,255,.05);color:#d1d5db;margin-top:8px}
.btn-mode-active{width:100%;padding:9px;border:none;border-radius:10px;background:#2563eb;color:#fff;margin-top:8px}
.btn-run{width:100%;padding:9px;border:none;border-radius:10px;background:#16a34a;color:#fff;font-weight:600;margin-top:8px}
.btn-run:disabled{opacity:.5;cursor:not-allowed}
.btn-mini{border:1px solid rgba(255,255,255,.15);border-radius:6px;background:rgba(255,255,255,.05);color:#d1d5db;font-size:11px;padding:4px 8px}
.btn-danger{color:#f87171}
.sidebar-section{margin-bottom:18px;display:flex;flex-direction:column}
.workflow-list{list-style:none;margin:6px 0 0;padding:0;display:flex;flex-direction:column;gap:6px}
.workflow-list li{display:flex;align-items:center;gap:6px;padding:6px;border:1px solid rgba(255,255,255,.06);border-radius:8px}
.workflow-meta{flex:1;display:flex;flex-direction:column;min-width:0}
.workflow-name{font-size:12px;white-space:nowrap;overflow:hidden;text-overflow:ellipsis}
.workflow-date{font-size:10px;color:#6b7280}
.field-hint{font-size:11px;color:#818cf8;margin:6px 0 0}
.field-error{font-size:11px;color:#f87171;margin:2px 0 0;min-height:13px}
#inbox-view{height:100%;display:flex;flex-direction:column;padding:16px;box-sizing:border-box;gap:12px}
.reports-strip{display:flex;gap:8px;align-items:center}
.inbox-layout{flex:1;display:flex;gap:12px;min-height:0}
.session-list{list-style:none;margin:0;padding:0;width:280px;overflow-y:auto;display:flex;flex-direction:column;gap:6px}
.session-button{width:100%;text-align:left;background:rgba(255,255,255,.03);border:1px solid rgba(255,255,255,.08);border-radius:10px;padding:10px;display:flex;flex-direction:column;gap:2px;color:inherit}
.session-button.active{border-color:#6366f1}
.session-name{font-size:13px;font-weight:600}
.session-platform{font-size:10px;text-transform:uppercase;color:#818cf8}
.session-preview{font-size:11px;color:#6b7280;white-space:nowrap;overflow:hidden;text-overflow:ellipsis}
.message-pane{flex:1;overflow-y:auto;display:flex;flex-direction:column;gap:8px;padding:8px}
.bubble{max-width:70%;padding:8px 12px;border-radius:12px;font-size:13px}
.bubble-in{background:rgba(255,255,255,.07);align-self:flex-start}
.bubble-out{background:#3730a3;align-self:flex-end}
.invoice-card{display:flex;align-items:center;gap:8px;align-self:flex-start;border:1px solid rgba(255,255,255,.12);border-radius:10px;padding:8px 12px;font-size:12px;background:rgba(255,255,255,.04)}
";

    let style = document.create_element("style")?;
    style.set_id("app-styles");
    style.set_text_content(Some(css));
    if let Ok(Some(head)) = document.query_selector("head") {
        head.append_child(&style)?;
    }
    Ok(())
}
