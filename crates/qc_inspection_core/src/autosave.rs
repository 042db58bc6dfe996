//! crates/qc_inspection_core/src/autosave.rs
//!
//! A restartable one-shot timer: every `schedule` cancels the task that is
//! still waiting and starts a new quiet period.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Debouncer {
    delay: Duration,
    pending: Option<CancellationToken>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Runs `task` once `delay` has passed without another call to `schedule`
    /// or `cancel`. Once the delay elapses the task runs to completion even if
    /// it is rescheduled meanwhile. Must be called inside a Tokio runtime.
    pub fn schedule(&mut self, task: BoxFuture<'static, ()>) {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.replace(token.clone()) {
            previous.cancel();
        }
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => task.await,
            }
        });
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
