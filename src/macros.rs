//! Small crate-wide convenience macros.

/// Debug-level console logging.  Compiles away in release builds and on
/// non-wasm targets so the pure-logic modules stay runnable under plain
/// `cargo test`.
#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(all(debug_assertions, target_arch = "wasm32"))]
        web_sys::console::debug_1(&format!($($t)*).into());
        #[cfg(not(all(debug_assertions, target_arch = "wasm32")))]
        { let _ = format_args!($($t)*); }
    }};
}

/// Warning-level console logging.  A no-op on native targets, where the
/// `web_sys::console` imports would trap.
#[macro_export]
macro_rules! warn_log {
    ($($t:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        web_sys::console::warn_1(&format!($($t)*).into());
        #[cfg(not(target_arch = "wasm32"))]
        { let _ = format_args!($($t)*); }
    }};
}

/// Error-level console logging, same target rules as [`warn_log!`].
#[macro_export]
macro_rules! error_log {
    ($($t:tt)*) => {{
        #[cfg(target_arch = "wasm32")]
        web_sys::console::error_1(&format!($($t)*).into());
        #[cfg(not(target_arch = "wasm32"))]
        { let _ = format_args!($($t)*); }
    }};
}
