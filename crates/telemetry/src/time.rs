// Path: crates/telemetry/src/time.rs
use std::time::{Duration, Instant};

/// Logs the time spent in a scope when dropped.
#[derive(Debug)]
pub struct ScopeTimer {
    label: &'static str,
    start: Instant,
}

impl ScopeTimer {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    /// Time since the timer was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopeTimer {
    fn drop(&mut self) {
        tracing::info!(
            target: "telemetry",
            scope = self.label,
            elapsed_us = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX),
            "scope finished"
        );
    }
}
