//! Explicit timer/cancellation debouncing.
//!
//! Every `schedule` call cancels the previously pending timer before
//! arming a new one, so a stale callback can never fire after a newer edit
//! - the ordering guarantee the config panel's auto-save relies on.

use gloo_timers::callback::Timeout;

pub struct Debouncer {
    delay_ms: u32,
    pending: Option<Timeout>,
}

impl Debouncer {
    pub fn new(delay_ms: u32) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    /// Arms `callback` to run after the configured delay, cancelling any
    /// previously scheduled callback first.
    pub fn schedule<F>(&mut self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        // Replacing the stored Timeout drops the old one, which clears the
        // underlying browser timer.
        self.pending = Some(Timeout::new(self.delay_ms, callback));
    }

    /// Drops the pending callback without running it. Required on unmount
    /// and on selection change so no write is attributed to a node that is
    /// no longer being edited.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
