//! Client for the managed push feed.
//!
//! [`RealtimeClient`] owns the raw WebSocket (reconnect with exponential
//! backoff, keep-alive pings, frame validation). [`ChannelRouter`] sits on
//! top and fans incoming frames out to per-topic handlers; `subscribe`
//! hands back a [`ChannelGuard`] whose `cancel` both removes the handler
//! and flips a closed flag checked at dispatch time, so a torn-down
//! channel cannot receive late frames - not even ones already in flight.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use js_sys::Array;
use serde_json::{json, Value};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{MessageEvent, WebSocket};

use crate::{debug_log, error_log, warn_log};

/// Represents the current state of the WebSocket connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
        }
    }
}

/// Transport interface. The production implementation wraps a browser
/// WebSocket; tests substitute a mock that records outbound frames.
pub trait IRealtimeClient: Any {
    fn connect(&mut self) -> Result<(), JsValue>;
    fn send_serialized_message(&self, message_json: &str) -> Result<(), JsValue>;
    fn connection_state(&self) -> ConnectionState;
    fn close(&mut self) -> Result<(), JsValue>;
    fn set_on_open(&mut self, callback: Box<dyn FnMut() + 'static>);
    fn set_on_message(&mut self, callback: Box<dyn FnMut(Value) + 'static>);
    fn set_on_close(&mut self, callback: Box<dyn FnMut() + 'static>);
    fn as_any(&self) -> &dyn Any;
}

/// Configuration for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    pub url: String,
    /// Maximum number of reconnection attempts (None for infinite).
    pub max_reconnect_attempts: Option<u32>,
    pub initial_backoff_ms: u32,
    pub max_backoff_ms: u32,
    /// Keep-alive ping interval (None to disable).
    pub ping_interval_ms: Option<u32>,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            url: super::get_realtime_url(),
            max_reconnect_attempts: None,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30000,
            ping_interval_ms: Some(30000),
        }
    }
}

type OnOpenCallback = Rc<RefCell<dyn FnMut()>>;
type OnMessageCallback = Rc<RefCell<dyn FnMut(Value)>>;
type OnCloseCallback = Rc<RefCell<dyn FnMut()>>;

fn subscribe_frame(topic: &str) -> Value {
    json!({ "action": "subscribe", "topic": topic })
}

fn unsubscribe_frame(topic: &str) -> Value {
    json!({ "action": "unsubscribe", "topic": topic })
}

fn ping_frame() -> Value {
    json!({ "action": "ping" })
}

/// Minimal shape check for an incoming frame: `topic` and `event` strings
/// plus a `payload` key. Anything else is dropped with a warning; the
/// connection stays open for subsequent valid frames.
fn frame_topic(frame: &Value) -> Option<String> {
    let obj = frame.as_object()?;
    let topic = obj.get("topic")?.as_str()?;
    if !obj.get("event").map_or(false, Value::is_string) {
        return None;
    }
    if !obj.contains_key("payload") {
        return None;
    }
    Some(topic.to_string())
}

/// WebSocket transport with reconnect and keep-alive.
pub struct RealtimeClient {
    config: RealtimeConfig,
    websocket: Option<WebSocket>,
    state: Rc<RefCell<ConnectionState>>,
    reconnect_attempt: Rc<RefCell<u32>>,
    ping_interval: Option<i32>,
    reconnect_timeout: Rc<RefCell<Option<i32>>>,
    on_open_callback: Option<OnOpenCallback>,
    on_message_callback: Option<OnMessageCallback>,
    on_close_callback: Option<OnCloseCallback>,
}

impl RealtimeClient {
    pub fn new(config: RealtimeConfig) -> Self {
        Self {
            config,
            websocket: None,
            state: Rc::new(RefCell::new(ConnectionState::Disconnected)),
            reconnect_attempt: Rc::new(RefCell::new(0)),
            ping_interval: None,
            reconnect_timeout: Rc::new(RefCell::new(None)),
            on_open_callback: None,
            on_message_callback: None,
            on_close_callback: None,
        }
    }

    pub fn new_default() -> Self {
        Self::new(RealtimeConfig::default())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    fn get_backoff_ms(&self) -> u32 {
        let attempt = *self.reconnect_attempt.borrow();
        let delay = self.config.initial_backoff_ms * 2_u32.pow(attempt.min(10));
        delay.min(self.config.max_backoff_ms)
    }

    fn setup_ping_interval(&mut self) {
        let Some(interval_ms) = self.config.ping_interval_ms else {
            return;
        };
        let window = web_sys::window().expect("no global window exists");
        let ws_clone = self.websocket.clone();

        let ping_callback = Closure::wrap(Box::new(move || {
            if let Some(ws) = &ws_clone {
                if let Ok(json) = serde_json::to_string(&ping_frame()) {
                    if let Err(e) = ws.send_with_str(&json) {
                        error_log!("Failed to send ping: {:?}", e);
                    }
                }
            }
        }) as Box<dyn FnMut()>);

        let interval_id = window
            .set_interval_with_callback_and_timeout_and_arguments(
                ping_callback.as_ref().unchecked_ref(),
                interval_ms as i32,
                &Array::new(),
            )
            .expect("Failed to set ping interval");

        ping_callback.forget();
        self.ping_interval = Some(interval_id);
    }

    fn clear_ping_interval(&mut self) {
        if let Some(interval_id) = self.ping_interval.take() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(interval_id);
            }
        }
    }

    /// Creates the socket and attaches the open/close/message handlers.
    /// Used by both `connect` and the reconnect path.
    fn establish_connection(&mut self) -> Result<WebSocket, JsValue> {
        let ws = WebSocket::new(&self.config.url)?;

        let state_clone = self.state.clone();
        let reconnect_attempt_clone = self.reconnect_attempt.clone();
        let on_open_cb = self.on_open_callback.clone();
        let on_message_cb = self.on_message_callback.clone();
        let on_close_cb = self.on_close_callback.clone();
        let client_for_reconnect = self.clone();
        let config_clone = self.config.clone();

        let onopen = Closure::wrap(Box::new(move |_: web_sys::Event| {
            debug_log!("Realtime feed connected");
            *state_clone.borrow_mut() = ConnectionState::Connected;
            *reconnect_attempt_clone.borrow_mut() = 0;
            if let Some(cb) = &on_open_cb {
                (cb.borrow_mut())();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
        onopen.forget();

        let onerror = Closure::wrap(Box::new(move |e: web_sys::Event| {
            error_log!("Realtime socket error: {:?}", e);
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        onerror.forget();

        let state_clone = self.state.clone();
        let reconnect_attempt_clone = self.reconnect_attempt.clone();
        let onclose = Closure::wrap(Box::new(move |_: web_sys::Event| {
            debug_log!("Realtime feed closed");
            *state_clone.borrow_mut() = ConnectionState::Disconnected;
            if let Some(cb) = &on_close_cb {
                (cb.borrow_mut())();
            }

            let current_attempt = *reconnect_attempt_clone.borrow();
            if config_clone
                .max_reconnect_attempts
                .map_or(true, |max| current_attempt < max)
            {
                *reconnect_attempt_clone.borrow_mut() = current_attempt + 1;
                client_for_reconnect.schedule_reconnect();
            } else {
                warn_log!("Max realtime reconnection attempts reached");
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
        onclose.forget();

        let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
            let Ok(text) = event.data().dyn_into::<js_sys::JsString>() else {
                warn_log!("Received non-text realtime frame");
                return;
            };
            let Some(msg_str) = text.as_string() else {
                return;
            };
            match serde_json::from_str::<Value>(&msg_str) {
                Ok(parsed) => {
                    if let Some(cb) = &on_message_cb {
                        (cb.borrow_mut())(parsed);
                    }
                }
                Err(e) => {
                    warn_log!("Dropping unparseable realtime frame: {e}");
                }
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
        onmessage.forget();

        Ok(ws)
    }

    fn schedule_reconnect(&self) {
        let window = web_sys::window().expect("no global window exists");
        let state_clone = self.state.clone();
        let delay = self.get_backoff_ms();
        let mut client_clone = self.clone();

        let reconnect_callback = Closure::once(Box::new(move || {
            if *state_clone.borrow() != ConnectionState::Disconnected {
                return;
            }
            debug_log!(
                "Attempting realtime reconnect (attempt {})",
                *client_clone.reconnect_attempt.borrow()
            );
            *state_clone.borrow_mut() = ConnectionState::Connecting;
            match client_clone.establish_connection() {
                Ok(ws) => {
                    client_clone.websocket = Some(ws);
                    client_clone.setup_ping_interval();
                }
                Err(e) => {
                    error_log!("Realtime reconnect failed: {:?}", e);
                    *state_clone.borrow_mut() = ConnectionState::Disconnected;
                    client_clone.schedule_reconnect();
                }
            }
        }) as Box<dyn FnOnce()>);

        // Store the timeout id so a manual connect() can cancel a pending
        // reconnect instead of racing it.
        let timeout_id = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                reconnect_callback.as_ref().unchecked_ref(),
                delay as i32,
            )
            .expect("Failed to schedule reconnection");
        *self.reconnect_timeout.borrow_mut() = Some(timeout_id);
        reconnect_callback.forget();
    }
}

impl IRealtimeClient for RealtimeClient {
    fn connect(&mut self) -> Result<(), JsValue> {
        *self.reconnect_attempt.borrow_mut() = 0;
        self.clear_ping_interval();
        *self.state.borrow_mut() = ConnectionState::Connecting;

        let ws = self.establish_connection()?;

        if let Some(timeout_id) = self.reconnect_timeout.borrow_mut().take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(timeout_id);
            }
        }

        self.websocket = Some(ws);
        self.setup_ping_interval();
        Ok(())
    }

    fn send_serialized_message(&self, message_json: &str) -> Result<(), JsValue> {
        match &self.websocket {
            Some(ws) if *self.state.borrow() == ConnectionState::Connected => {
                ws.send_with_str(message_json)
            }
            Some(_) => Err(JsValue::from_str("Realtime socket is not connected")),
            None => Err(JsValue::from_str("Realtime socket is not initialized")),
        }
    }

    fn connection_state(&self) -> ConnectionState {
        self.connection_state()
    }

    fn close(&mut self) -> Result<(), JsValue> {
        self.clear_ping_interval();
        *self.state.borrow_mut() = ConnectionState::Disconnected;
        if let Some(ws) = self.websocket.take() {
            if let Err(e) = ws.close_with_code(1000) {
                error_log!("Error sending close command: {:?}", e);
            }
        }
        Ok(())
    }

    fn set_on_open(&mut self, callback: Box<dyn FnMut() + 'static>) {
        self.on_open_callback = Some(Rc::new(RefCell::new(callback)));
    }

    fn set_on_message(&mut self, callback: Box<dyn FnMut(Value) + 'static>) {
        self.on_message_callback = Some(Rc::new(RefCell::new(callback)));
    }

    fn set_on_close(&mut self, callback: Box<dyn FnMut() + 'static>) {
        self.on_close_callback = Some(Rc::new(RefCell::new(callback)));
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Clone for RealtimeClient {
    fn clone(&self) -> Self {
        // Shares connection state/config through the Rc's but never the
        // socket or timer ids; used to hand the reconnect closure a handle
        // onto the same logical client.
        Self {
            config: self.config.clone(),
            websocket: None,
            state: self.state.clone(),
            reconnect_attempt: self.reconnect_attempt.clone(),
            ping_interval: None,
            reconnect_timeout: self.reconnect_timeout.clone(),
            on_open_callback: self.on_open_callback.clone(),
            on_message_callback: self.on_message_callback.clone(),
            on_close_callback: self.on_close_callback.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Channel routing
// ---------------------------------------------------------------------------

/// Handler invoked with the full validated frame for its topic.
pub type ChannelHandler = Rc<RefCell<dyn FnMut(Value)>>;

struct HandlerEntry {
    id: u64,
    closed: Rc<Cell<bool>>,
    handler: ChannelHandler,
}

/// Fans incoming frames out to per-topic handlers and keeps the backend's
/// idea of "topics we listen to" in sync (subscribe on first handler,
/// unsubscribe when the last one goes away).
pub struct ChannelRouter {
    transport: Rc<RefCell<dyn IRealtimeClient>>,
    channels: HashMap<String, Vec<HandlerEntry>>,
    next_handler_id: u64,
}

impl ChannelRouter {
    pub fn new(transport: Rc<RefCell<dyn IRealtimeClient>>) -> Self {
        Self {
            transport,
            channels: HashMap::new(),
            next_handler_id: 0,
        }
    }

    /// Registers `handler` for `topic` and returns the guard that owns the
    /// subscription. Dropping (or cancelling) the guard makes further
    /// delivery to this handler impossible.
    pub fn subscribe<F>(router: &Rc<RefCell<ChannelRouter>>, topic: &str, handler: F) -> ChannelGuard
    where
        F: FnMut(Value) + 'static,
    {
        let closed = Rc::new(Cell::new(false));
        let handler_id = {
            let mut r = router.borrow_mut();
            let id = r.next_handler_id;
            r.next_handler_id += 1;
            let first_for_topic = !r.channels.contains_key(topic);
            r.channels.entry(topic.to_string()).or_default().push(HandlerEntry {
                id,
                closed: closed.clone(),
                handler: Rc::new(RefCell::new(handler)),
            });
            if first_for_topic {
                r.send_frame(&subscribe_frame(topic));
            }
            id
        };

        ChannelGuard {
            inner: Rc::new(GuardInner {
                topic: topic.to_string(),
                handler_id,
                closed,
                router: Rc::downgrade(router),
            }),
        }
    }

    /// Routes one incoming frame to the handlers of its topic. Handlers are
    /// cloned out and the router borrow released before any user code runs,
    /// so a handler may subscribe/unsubscribe without re-entrancy panics.
    pub fn route_incoming(router: &Rc<RefCell<ChannelRouter>>, frame: Value) {
        let Some(topic) = frame_topic(&frame) else {
            warn_log!("Dropping malformed realtime frame: {frame}");
            return;
        };

        let entries: Vec<(Rc<Cell<bool>>, ChannelHandler)> = router
            .borrow()
            .channels
            .get(&topic)
            .map(|entries| {
                entries
                    .iter()
                    .map(|e| (e.closed.clone(), e.handler.clone()))
                    .collect()
            })
            .unwrap_or_default();

        if entries.is_empty() {
            debug_log!("No handlers registered for topic: {topic}");
            return;
        }

        for (closed, handler) in entries {
            // Re-checked per handler: an earlier handler in this very
            // dispatch may have torn a later one down.
            if closed.get() {
                continue;
            }
            (handler.borrow_mut())(frame.clone());
        }
    }

    fn remove_handler(&mut self, topic: &str, handler_id: u64) {
        let mut emptied = false;
        if let Some(entries) = self.channels.get_mut(topic) {
            entries.retain(|e| e.id != handler_id);
            emptied = entries.is_empty();
        }
        if emptied {
            self.channels.remove(topic);
            self.send_frame(&unsubscribe_frame(topic));
        }
    }

    /// Re-announces every live topic; called after a reconnect.
    pub fn resubscribe_all(&self) {
        for topic in self.channels.keys() {
            self.send_frame(&subscribe_frame(topic));
        }
    }

    fn send_frame(&self, frame: &Value) {
        let json = match serde_json::to_string(frame) {
            Ok(json) => json,
            Err(e) => {
                error_log!("Failed to serialize realtime frame: {e}");
                return;
            }
        };
        match self.transport.try_borrow() {
            Ok(transport) => {
                if let Err(e) = transport.send_serialized_message(&json) {
                    // Not fatal: resubscribe_all replays topics once the
                    // transport reconnects.
                    warn_log!("Realtime send failed: {:?}", e);
                }
            }
            Err(_) => warn_log!("Transport busy, dropping outbound frame"),
        }
    }

    #[cfg(test)]
    pub fn has_subscription(&self, topic: &str) -> bool {
        self.channels.contains_key(topic)
    }

    #[cfg(test)]
    pub fn subscription_count(&self) -> usize {
        self.channels.len()
    }
}

struct GuardInner {
    topic: String,
    handler_id: u64,
    closed: Rc<Cell<bool>>,
    router: Weak<RefCell<ChannelRouter>>,
}

impl GuardInner {
    fn close(&self) {
        // Flag first: even a frame already mid-dispatch can no longer reach
        // the handler.
        if self.closed.replace(true) {
            return;
        }
        if let Some(router) = self.router.upgrade() {
            if let Ok(mut r) = router.try_borrow_mut() {
                r.remove_handler(&self.topic, self.handler_id);
            }
        }
    }
}

impl Drop for GuardInner {
    fn drop(&mut self) {
        self.close();
    }
}

/// Cancellable subscription handle. Cheap to clone; all clones refer to the
/// same underlying channel, and cancelling any of them (or dropping the
/// last) tears the channel down exactly once.
#[derive(Clone)]
pub struct ChannelGuard {
    inner: Rc<GuardInner>,
}

impl ChannelGuard {
    pub fn cancel(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

#[cfg(test)]
pub mod testing {
    //! Mock transport shared by the native test suites.

    use super::*;

    #[derive(Clone)]
    pub struct MockRealtimeClient {
        pub state: Rc<RefCell<ConnectionState>>,
        pub sent_messages: Rc<RefCell<Vec<String>>>,
        pub on_message: Rc<RefCell<Option<Box<dyn FnMut(Value)>>>>,
    }

    impl MockRealtimeClient {
        pub fn new() -> Self {
            Self {
                state: Rc::new(RefCell::new(ConnectionState::Connected)),
                sent_messages: Rc::new(RefCell::new(Vec::new())),
                on_message: Rc::new(RefCell::new(None)),
            }
        }

        pub fn sent(&self) -> Vec<String> {
            self.sent_messages.borrow().clone()
        }
    }

    impl IRealtimeClient for MockRealtimeClient {
        fn connect(&mut self) -> Result<(), JsValue> {
            *self.state.borrow_mut() = ConnectionState::Connected;
            Ok(())
        }

        fn send_serialized_message(&self, message_json: &str) -> Result<(), JsValue> {
            self.sent_messages.borrow_mut().push(message_json.to_string());
            Ok(())
        }

        fn connection_state(&self) -> ConnectionState {
            self.state.borrow().clone()
        }

        fn close(&mut self) -> Result<(), JsValue> {
            *self.state.borrow_mut() = ConnectionState::Disconnected;
            Ok(())
        }

        fn set_on_open(&mut self, _callback: Box<dyn FnMut() + 'static>) {}

        fn set_on_message(&mut self, callback: Box<dyn FnMut(Value) + 'static>) {
            *self.on_message.borrow_mut() = Some(callback);
        }

        fn set_on_close(&mut self, _callback: Box<dyn FnMut() + 'static>) {}

        fn as_any(&self) -> &dyn Any {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockRealtimeClient;
    use super::*;

    fn make_router() -> (Rc<RefCell<ChannelRouter>>, MockRealtimeClient) {
        let mock = MockRealtimeClient::new();
        let transport: Rc<RefCell<dyn IRealtimeClient>> = Rc::new(RefCell::new(mock.clone()));
        (
            Rc::new(RefCell::new(ChannelRouter::new(transport))),
            mock,
        )
    }

    fn frame(topic: &str, payload: Value) -> Value {
        json!({ "topic": topic, "event": "UPDATE", "payload": payload })
    }

    #[test]
    fn first_subscription_announces_topic_to_backend() {
        let (router, mock) = make_router();
        let _guard = ChannelRouter::subscribe(&router, "live-run-1", |_| {});
        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("subscribe"));
        assert!(sent[0].contains("live-run-1"));
    }

    #[test]
    fn frames_reach_only_their_topic() {
        let (router, _mock) = make_router();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _guard = ChannelRouter::subscribe(&router, "live-run-1", move |f| {
            seen_clone.borrow_mut().push(f);
        });

        ChannelRouter::route_incoming(&router, frame("live-run-1", json!({"n": 1})));
        ChannelRouter::route_incoming(&router, frame("live-run-2", json!({"n": 2})));

        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn malformed_frames_are_dropped() {
        let (router, _mock) = make_router();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        let _guard = ChannelRouter::subscribe(&router, "live-run-1", move |_| {
            hits_clone.set(hits_clone.get() + 1);
        });

        ChannelRouter::route_incoming(&router, json!("not an object"));
        ChannelRouter::route_incoming(&router, json!({ "topic": "live-run-1" }));
        ChannelRouter::route_incoming(&router, frame("live-run-1", json!({})));

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn cancel_unsubscribes_and_blocks_delivery() {
        let (router, mock) = make_router();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        let guard = ChannelRouter::subscribe(&router, "live-run-1", move |_| {
            hits_clone.set(hits_clone.get() + 1);
        });

        guard.cancel();
        assert!(guard.is_closed());
        assert!(!router.borrow().has_subscription("live-run-1"));
        assert!(mock.sent().iter().any(|m| m.contains("unsubscribe")));

        ChannelRouter::route_incoming(&router, frame("live-run-1", json!({})));
        assert_eq!(hits.get(), 0);

        // Cancelling again (or via a clone) is a no-op.
        guard.clone().cancel();
        assert_eq!(
            mock.sent()
                .iter()
                .filter(|m| m.contains("unsubscribe"))
                .count(),
            1
        );
    }

    #[test]
    fn dropping_the_last_guard_clone_tears_down() {
        let (router, _mock) = make_router();
        let guard = ChannelRouter::subscribe(&router, "live-run-1", |_| {});
        let clone = guard.clone();
        drop(guard);
        assert!(router.borrow().has_subscription("live-run-1"));
        drop(clone);
        assert!(!router.borrow().has_subscription("live-run-1"));
    }

    #[test]
    fn handler_cancelled_mid_dispatch_never_runs() {
        let (router, _mock) = make_router();

        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        let victim = ChannelRouter::subscribe(&router, "live-run-1", move |_| {
            hits_clone.set(hits_clone.get() + 1);
        });

        // A second handler on the same topic cancels the first while the
        // dispatch list has already been snapshotted.
        let victim_clone = victim.clone();
        let _killer = ChannelRouter::subscribe(&router, "live-run-1", move |_| {
            victim_clone.cancel();
        });

        // Registration order: victim first, killer second, so the victim
        // fires once before the killer closes it...
        ChannelRouter::route_incoming(&router, frame("live-run-1", json!({})));
        assert_eq!(hits.get(), 1);

        // ...and never again afterwards.
        ChannelRouter::route_incoming(&router, frame("live-run-1", json!({})));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn resubscribe_all_replays_live_topics() {
        let (router, mock) = make_router();
        let _a = ChannelRouter::subscribe(&router, "live-run-1", |_| {});
        let _b = ChannelRouter::subscribe(&router, "realtime-messages-7", |_| {});
        let before = mock.sent().len();
        router.borrow().resubscribe_all();
        assert_eq!(mock.sent().len(), before + 2);
    }
}
