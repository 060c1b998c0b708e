//! localStorage persistence for view-level preferences.
//!
//! Only presentation state lives here (active tab, viewport transform);
//! graphs themselves are owned by the backend.

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

use crate::state::WorkflowStore;

const KEY_ACTIVE_VIEW: &str = "bizflow_active_view";
const KEY_VIEWPORT: &str = "bizflow_viewport";

/// Which top-level tab is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveView {
    Workflows,
    Inbox,
}

#[derive(Serialize, Deserialize)]
struct ViewportData {
    x: f64,
    y: f64,
    zoom: f64,
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

pub fn save_view(state: &WorkflowStore) -> Result<(), JsValue> {
    let Some(storage) = local_storage() else {
        return Ok(());
    };

    let view = serde_json::to_string(&state.active_view)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    storage.set_item(KEY_ACTIVE_VIEW, &view)?;

    let viewport = ViewportData {
        x: state.viewport_x,
        y: state.viewport_y,
        zoom: state.zoom_level,
    };
    let viewport =
        serde_json::to_string(&viewport).map_err(|e| JsValue::from_str(&e.to_string()))?;
    storage.set_item(KEY_VIEWPORT, &viewport)?;
    Ok(())
}

/// Restores persisted presentation state; anything missing or unparseable
/// is simply left at its default.
pub fn load_view(state: &mut WorkflowStore) {
    let Some(storage) = local_storage() else {
        return;
    };

    if let Ok(Some(raw)) = storage.get_item(KEY_ACTIVE_VIEW) {
        if let Ok(view) = serde_json::from_str::<ActiveView>(&raw) {
            state.active_view = view;
        }
    }

    if let Ok(Some(raw)) = storage.get_item(KEY_VIEWPORT) {
        if let Ok(viewport) = serde_json::from_str::<ViewportData>(&raw) {
            state.viewport_x = viewport.x;
            state.viewport_y = viewport.y;
            state.zoom_level = viewport.zoom;
        }
    }
}
