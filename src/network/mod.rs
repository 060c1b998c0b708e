// Re-export network modules
pub mod api_client;
pub mod realtime;

pub use api_client::ApiClient;
pub use realtime::{ChannelGuard, ChannelRouter, IRealtimeClient, RealtimeClient};

/// Base URL of the REST backend.
pub(crate) fn get_api_base_url() -> String {
    #[cfg(debug_assertions)]
    {
        "http://localhost:8000".to_string()
    }
    #[cfg(not(debug_assertions))]
    {
        page_origin("http")
    }
}

/// Base URL of the managed-table REST reads (PostgREST style).
pub(crate) fn get_data_base_url() -> String {
    #[cfg(debug_assertions)]
    {
        "http://localhost:54321/rest/v1".to_string()
    }
    #[cfg(not(debug_assertions))]
    {
        format!("{}/rest/v1", page_origin("http"))
    }
}

/// WebSocket endpoint of the managed push feed.
pub(crate) fn get_realtime_url() -> String {
    #[cfg(debug_assertions)]
    {
        "ws://localhost:54321/realtime/v1".to_string()
    }
    #[cfg(not(debug_assertions))]
    {
        format!("{}/realtime/v1", page_origin("ws"))
    }
}

#[cfg(not(debug_assertions))]
fn page_origin(scheme: &str) -> String {
    let location = web_sys::window()
        .expect("no global window exists")
        .location();
    let host = location.host().unwrap_or_else(|_| "localhost".to_string());
    let secure = location
        .protocol()
        .map(|p| p == "https:")
        .unwrap_or(false);
    let scheme = match (scheme, secure) {
        ("ws", true) => "wss",
        ("ws", false) => "ws",
        (_, true) => "https",
        (_, false) => "http",
    };
    format!("{}://{}", scheme, host)
}

/// Identity of the signed-in user. Auth flows are out of scope here; the
/// id is whatever the login shell left in localStorage, with a demo
/// fallback so the builder works stand-alone.
pub(crate) fn current_user_id() -> String {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(Some(id)) = storage.get_item("bizflow_user_id") {
                if !id.is_empty() {
                    return id;
                }
            }
        }
    }
    "demo-user".to_string()
}
