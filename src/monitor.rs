//! Live Monitor Protocol: maps the server-pushed change feed for one run
//! onto the store's `node_states`.
//!
//! Per run the client moves through Idle -> Subscribed -> Updating ->
//! Torn down. The whole status map is replaced on every event (last write
//! wins; the backend owns ordering) - merging per-node deltas could mask a
//! backend that silently stops reporting a node, so it is deliberately not
//! done here.

use serde_json::Value;

use crate::models::{NodeRunState, NodeStates};
use crate::network::realtime::{ChannelGuard, ChannelRouter};
use crate::state::AppContext;
use crate::{debug_log, warn_log};

/// Channel name for one run's row updates.
pub fn run_topic(run_id: &str) -> String {
    format!("live-run-{run_id}")
}

/// Opens the monitor subscription for `run_id`, tearing down any previous
/// one first so exactly one channel is ever live (rapid double-execute
/// included). The guard is stored on the store and also returned for
/// manual disposal, e.g. on navigation away.
pub fn start_run(ctx: &AppContext, run_id: &str) -> ChannelGuard {
    // Teardown before open: a reused channel name must never deliver the
    // previous run's updates into the new session.
    ctx.store.borrow_mut().clear_run_state();

    let store = ctx.store.clone();
    let expected_run = run_id.to_string();
    let guard = ChannelRouter::subscribe(&ctx.router, &run_topic(run_id), move |frame| {
        match parse_run_update(&frame, &expected_run) {
            Some(states) => {
                store.borrow_mut().apply_run_snapshot(&expected_run, states);
            }
            None => {
                warn_log!("Dropping monitor update without usable step_results");
            }
        }
    });

    ctx.store.borrow_mut().install_run(run_id, guard.clone());
    debug_log!("Live monitor subscribed for run {run_id}");
    guard
}

/// Extracts the per-node status map from a row-update frame.
///
/// Returns `None` when the frame belongs to a different run or lacks the
/// `step_results` field - such events are dropped, never merged, so a
/// malformed push can't corrupt the map. Individual entries that fail to
/// parse (e.g. the `trigger_data` context blob) are skipped.
pub fn parse_run_update(frame: &Value, expected_run: &str) -> Option<NodeStates> {
    let row = frame.get("payload")?;

    // Server-side filtering is scoped by run id too, but the client does
    // not assume it is perfect.
    if let Some(run_id) = row.get("run_id").and_then(Value::as_str) {
        if run_id != expected_run {
            debug_log!("Ignoring update for foreign run {run_id}");
            return None;
        }
    }

    let step_results = row.get("step_results")?.as_object()?;

    let mut states = NodeStates::with_capacity(step_results.len());
    for (node_id, raw) in step_results {
        match serde_json::from_value::<NodeRunState>(raw.clone()) {
            Ok(state) => {
                states.insert(node_id.clone(), state);
            }
            Err(_) => {
                debug_log!("Skipping non-status entry '{node_id}' in step_results");
            }
        }
    }
    Some(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RunStatus;
    use serde_json::json;

    fn frame(run_id: &str, step_results: Value) -> Value {
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
    fn parses_status_map_and_skips_context_entries() {
        let frame = frame(
            "r1",
            json!({
                "n1": { "status": "completed", "data": { "ok": true } },
                "n2": { "status": "running" },
                "trigger_data": "raw payload, not a node"
            }),
        );
        let states = parse_run_update(&frame, "r1").unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states["n1"].status, RunStatus::Completed);
        assert_eq!(states["n2"].status, RunStatus::Running);
    }

    #[test]
    fn rejects_foreign_run_ids() {
        let frame = frame("other-run", json!({ "n1": { "status": "running" } }));
        assert!(parse_run_update(&frame, "r1").is_none());
    }

    #[test]
    fn drops_updates_without_step_results() {
        let frame = json!({
            "topic": "live-run-r1",
            "event": "UPDATE",
            "payload": { "run_id": "r1", "status": "running" }
        });
        assert!(parse_run_update(&frame, "r1").is_none());
    }

    #[test]
    fn failed_entries_carry_their_error() {
        let frame = frame(
            "r1",
            json!({ "n1": { "status": "failed", "error": "WhatsApp API timed out" } }),
        );
        let states = parse_run_update(&frame, "r1").unwrap();
        assert_eq!(states["n1"].status, RunStatus::Failed);
        assert_eq!(states["n1"].error.as_deref(), Some("WhatsApp API timed out"));
    }
}
