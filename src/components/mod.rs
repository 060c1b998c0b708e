pub mod config_panel;
pub mod inbox;
pub mod sidebar;
pub mod workflow_canvas;

/// Minimal HTML escaping for text interpolated into component templates.
pub(crate) fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
