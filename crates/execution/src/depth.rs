// Path: crates/execution/src/depth.rs

//! Tracks how many contract runs are in flight.
//!
//! Entering a run hands out a [`DepthGuard`]; the count is restored when the guard
//! drops, so every exit path of the driver, including early returns and panics,
//! leaves the counter where it found it.

use cvm_types::error::ExecutionError;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static GLOBAL_DEPTH: Lazy<Arc<CallDepth>> = Lazy::new(|| Arc::new(CallDepth::new()));

/// A shared call-depth counter.
#[derive(Debug, Default)]
pub struct CallDepth {
    depth: AtomicUsize,
}

impl CallDepth {
    /// Creates a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide counter used by executors that are not given their own.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_DEPTH)
    }

    /// The current depth.
    pub fn current(&self) -> usize {
        self.depth.load(Ordering::Acquire)
    }

    /// Increments the depth, failing if the result would exceed `max`.
    ///
    /// The counter never holds a value above `max`, so a failed attempt is invisible
    /// to concurrent callers.
    pub fn enter(&self, max: usize) -> Result<DepthGuard<'_>, ExecutionError> {
        let previous = self
            .depth
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |depth| {
                (depth < max).then_some(depth + 1)
            })
            .map_err(|_| ExecutionError::CallDepthExceeded { max })?;
        Ok(DepthGuard {
            counter: self,
            depth: previous + 1,
        })
    }
}

/// Holds one level of call depth until dropped.
#[derive(Debug)]
#[must_use = "the depth is released as soon as the guard is dropped"]
pub struct DepthGuard<'a> {
    counter: &'a CallDepth,
    depth: usize,
}

impl DepthGuard<'_> {
    /// The depth this guard entered at.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.counter.depth.fetch_sub(1, Ordering::AcqRel);
    }
}
