//! Live Monitor Protocol tests against a mock realtime transport.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use crate::messages::{Command, Message};
use crate::models::RunStatus;
use crate::monitor::{run_topic, start_run};
use crate::network::realtime::testing::MockRealtimeClient;
use crate::network::realtime::ChannelRouter;
use crate::network::IRealtimeClient;
use crate::state::{AppContext, WorkflowStore};
use crate::update::update;

fn make_ctx() -> (AppContext, MockRealtimeClient) {
    let mock = MockRealtimeClient::new();
    let transport: Rc<RefCell<dyn IRealtimeClient>> = Rc::new(RefCell::new(mock.clone()));
    (AppContext::new(transport), mock)
}

fn update_frame(run_id: &str, step_results: serde_json::Value) -> serde_json::Value {
    json!({
        "topic": run_topic(run_id),
        "event": "UPDATE",
        "payload": {
            "run_id": run_id,
            "status": "running",
            "step_results": step_results,
        }
    })
}

#[test]
fn run_updates_replace_the_status_map_wholesale() {
    let (ctx, _mock) = make_ctx();
    start_run(&ctx, "r1");

    ChannelRouter::route_incoming(
        &ctx.router,
        update_frame(
            "r1",
            json!({
                "n1": { "status": "running" },
                "n2": { "status": "pending" },
            }),
        ),
    );
    {
        let store = ctx.store.borrow();
        assert_eq!(store.node_states["n1"].status, RunStatus::Running);
        assert_eq!(store.node_states.len(), 2);
    }

    // The next snapshot omits n2: wholesale replacement means it is gone,
    // not silently stuck at its previous status.
    ChannelRouter::route_incoming(
        &ctx.router,
        update_frame("r1", json!({ "n1": { "status": "completed" } })),
    );
    let store = ctx.store.borrow();
    assert_eq!(store.node_states["n1"].status, RunStatus::Completed);
    assert!(!store.node_states.contains_key("n2"));
}

#[test]
fn starting_a_new_run_leaves_exactly_one_subscription() {
    let (ctx, mock) = make_ctx();

    start_run(&ctx, "run-a");
    start_run(&ctx, "run-b");

    let router = ctx.router.borrow();
    assert_eq!(router.subscription_count(), 1);
    assert!(router.has_subscription(&run_topic("run-b")));
    assert!(!router.has_subscription(&run_topic("run-a")));

    // Teardown happened before the new channel opened.
    let sent = mock.sent();
    let unsub_a = sent
        .iter()
        .position(|m| m.contains("unsubscribe") && m.contains("run-a"))
        .expect("run-a unsubscribed");
    let sub_b = sent
        .iter()
        .position(|m| m.contains("subscribe") && m.contains("run-b") && !m.contains("unsubscribe"))
        .expect("run-b subscribed");
    assert!(unsub_a < sub_b);
}

#[test]
fn stale_run_events_never_alter_state() {
    let (ctx, _mock) = make_ctx();
    start_run(&ctx, "run-a");
    start_run(&ctx, "run-b");

    // An update for the dead run arrives late on its old topic.
    ChannelRouter::route_incoming(
        &ctx.router,
        update_frame("run-a", json!({ "n1": { "status": "completed" } })),
    );
    assert!(ctx.store.borrow().node_states.is_empty());

    // Even a frame delivered on the live topic but tagged with the old run
    // id is filtered defensively.
    ChannelRouter::route_incoming(
        &ctx.router,
        json!({
            "topic": run_topic("run-b"),
            "event": "UPDATE",
            "payload": {
                "run_id": "run-a",
                "step_results": { "n1": { "status": "completed" } },
            }
        }),
    );
    assert!(ctx.store.borrow().node_states.is_empty());
}

#[test]
fn malformed_updates_are_dropped_and_the_channel_survives() {
    let (ctx, _mock) = make_ctx();
    start_run(&ctx, "r1");

    // Missing step_results: dropped.
    ChannelRouter::route_incoming(
        &ctx.router,
        json!({
            "topic": run_topic("r1"),
            "event": "UPDATE",
            "payload": { "run_id": "r1", "status": "running" }
        }),
    );
    assert!(ctx.store.borrow().node_states.is_empty());

    // A later well-formed event on the same channel still applies.
    ChannelRouter::route_incoming(
        &ctx.router,
        update_frame("r1", json!({ "n1": { "status": "running" } })),
    );
    assert_eq!(
        ctx.store.borrow().node_states["n1"].status,
        RunStatus::Running
    );
}

#[test]
fn teardown_makes_late_delivery_impossible() {
    let (ctx, _mock) = make_ctx();
    let guard = start_run(&ctx, "r1");

    ctx.store.borrow_mut().clear_run_state();
    assert!(guard.is_closed());
    assert_eq!(ctx.router.borrow().subscription_count(), 0);

    ChannelRouter::route_incoming(
        &ctx.router,
        update_frame("r1", json!({ "n1": { "status": "completed" } })),
    );
    let store = ctx.store.borrow();
    assert!(store.node_states.is_empty());
    assert!(store.current_run_id.is_none());
}

#[test]
fn leaving_monitor_mode_tears_down_the_channel() {
    let (ctx, _mock) = make_ctx();
    ctx.store.borrow_mut().set_monitor_mode(true);
    start_run(&ctx, "r1");
    assert!(ctx.store.borrow().has_run_channel());

    ctx.store.borrow_mut().set_monitor_mode(false);

    assert!(!ctx.store.borrow().has_run_channel());
    assert_eq!(ctx.router.borrow().subscription_count(), 0);
}

#[test]
fn node_status_lifecycle_is_observed_in_order() {
    let (ctx, _mock) = make_ctx();
    start_run(&ctx, "r1");

    // Absent entry renders pending (checked via renderer mapping).
    let style = crate::canvas::renderer::status_style(ctx.store.borrow().node_states.get("n1"));
    assert_eq!(style.label, "Pending");

    for (status, expected) in [
        ("running", RunStatus::Running),
        ("completed", RunStatus::Completed),
    ] {
        ChannelRouter::route_incoming(
            &ctx.router,
            update_frame("r1", json!({ "n1": { "status": status } })),
        );
        assert_eq!(ctx.store.borrow().node_states["n1"].status, expected);
    }
}

#[test]
fn run_started_message_requests_the_monitor_subscription() {
    let mut store = WorkflowStore::new();
    store.pending.executing = true;

    let mut commands = Vec::new();
    update(
        &mut store,
        &Message::RunStarted {
            run_id: "r9".to_string(),
        },
        &mut commands,
    );

    assert!(!store.pending.executing);
    assert!(commands
        .iter()
        .any(|c| matches!(c, Command::StartRunMonitor { run_id } if run_id == "r9")));
}
