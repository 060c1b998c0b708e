//! Scenario tests that exercise the store and reducer across messages,
//! and the live-monitor protocol against a mock transport.

mod monitor_protocol;
mod store_invariants;
