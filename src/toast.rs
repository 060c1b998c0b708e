//! Tiny toast / notification helper.
//! Creates a `#toast-root` container once per page and appends toast divs
//! that fade out after a few seconds. On non-wasm targets (unit tests)
//! every function is a silent no-op.

#[derive(Debug, Clone, Copy)]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

pub fn success(msg: &str) {
    show(msg, ToastKind::Success);
}

pub fn error(msg: &str) {
    show(msg, ToastKind::Error);
}

pub fn info(msg: &str) {
    show(msg, ToastKind::Info);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn show(message: &str, kind: ToastKind) {
    let _ = (message, kind);
}

#[cfg(target_arch = "wasm32")]
pub fn show(message: &str, kind: ToastKind) {
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::{Document, Element, HtmlElement};

    let window = match web_sys::window() {
        Some(w) => w,
        None => return,
    };
    let document = match window.document() {
        Some(d) => d,
        None => return,
    };

    let root = match ensure_root(&document) {
        Some(el) => el,
        None => return,
    };

    let toast = match document.create_element("div") {
        Ok(el) => el,
        Err(_) => return,
    };
    toast.set_class_name("toast");
    let class = match kind {
        ToastKind::Success => "toast-success",
        ToastKind::Error => "toast-error",
        ToastKind::Info => "toast-info",
    };
    let _ = toast.class_list().add_1(class);
    toast.set_text_content(Some(message));

    // Prepend so the newest appears on top.
    let _ = root.prepend_with_node_1(&toast);

    // Auto-remove after 4s.
    let toast_clone: HtmlElement = toast.unchecked_into();
    let cb = Closure::once_into_js(move || {
        if let Some(parent) = toast_clone.parent_node() {
            let _ = parent.remove_child(&toast_clone);
        }
    });
    let _ = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(cb.as_ref().unchecked_ref(), 4000);

    ensure_styles(&document);

    fn ensure_root(document: &Document) -> Option<Element> {
        if let Some(el) = document.get_element_by_id("toast-root") {
            return Some(el);
        }
        let root = document.create_element("div").ok()?;
        root.set_id("toast-root");
        root.set_class_name("toast-root");
        document.body()?.append_child(&root).ok()?;
        Some(root)
    }

    fn ensure_styles(document: &Document) {
        if document.get_element_by_id("toast-styles").is_some() {
            return;
        }

        let css = "
.toast-root{position:fixed;top:16px;right:16px;display:flex;flex-direction:column;gap:8px;z-index:9999;font-family:system-ui,sans-serif}
.toast{padding:10px 16px;border-radius:6px;color:#fff;box-shadow:0 2px 6px rgba(0,0,0,.4);opacity:0;animation:toast-in .2s forwards;font-size:13px}
.toast-success{background:#15803d}
.toast-error{background:#b91c1c}
.toast-info{background:#1d4ed8}
.spinner{display:inline-block;width:14px;height:14px;border:2px solid #fff;border-top-color:transparent;border-radius:50%;animation:spin 1s linear infinite;vertical-align:middle}
@keyframes spin{to{transform:rotate(360deg)}}
@keyframes toast-in{to{opacity:1}}
";

        if let Ok(style) = document.create_element("style") {
            style.set_id("toast-styles");
            style.set_text_content(Some(css));
            if let Ok(Some(head)) = document.query_selector("head") {
                let _ = head.append_child(&style);
            } else if let Some(body) = document.body() {
                let _ = body.append_child(&style);
            }
        }
    }
}
