//! Debounced search input.
//!
//! Raw input arrives once per keystroke; a value is committed only after the
//! input has been quiet for the whole delay. The timer is a single resettable
//! [`Sleep`], so a new input simply moves its deadline.

use std::pin::Pin;
use std::time::Duration;

use tokio::time::{sleep, Instant, Sleep};
use tracing::trace;

/// Turns per-keystroke input into committed queries
#[derive(Debug)]
pub struct QueryDebouncer {
    delay: Duration,
    timer: Pin<Box<Sleep>>,
    pending: Option<String>,
}

impl QueryDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timer: Box::pin(sleep(delay)),
            pending: None,
        }
    }

    /// Record a raw input value and restart the quiet interval
    pub fn input(&mut self, value: impl Into<String>) {
        let value = value.into();
        trace!(value = %value, "Search input");
        self.pending = Some(value);
        self.timer.as_mut().reset(Instant::now() + self.delay);
    }

    /// Whether a value is waiting to be committed
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the pending value to be committed.
    ///
    /// Cancel-safe: dropping the future keeps the pending value. Never
    /// resolves while nothing is pending.
    pub async fn committed(&mut self) -> String {
        (&mut self.timer).await;
        match self.pending.take() {
            Some(value) => value,
            None => std::future::pending().await,
        }
    }

    /// Discard the pending value; nothing is committed afterwards
    pub fn dispose(&mut self) {
        if self.pending.take().is_some() {
            trace!("Discarded pending search input");
        }
    }
}
