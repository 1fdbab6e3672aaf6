// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global busy indicator: counts in-flight operations.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Counter of concurrent in-flight operations.
///
/// The confirmation core only ever increments and decrements it.
pub trait LoadingTracker: Send + Sync {
    fn add_loading_process(&self);
    fn remove_loading_process(&self);
}

/// Default tracker: never drops below zero and publishes a busy flag.
pub struct Loader {
    in_flight: AtomicUsize,
    busy: watch::Sender<bool>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let (busy, _) = watch::channel(false);
        Self { in_flight: AtomicUsize::new(0), busy }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    /// Watch the busy flag (true while at least one operation is in flight).
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    fn publish(&self, count: usize) {
        self.busy.send_if_modified(|busy| {
            let next = count > 0;
            let changed = *busy != next;
            *busy = next;
            changed
        });
    }
}

impl LoadingTracker for Loader {
    fn add_loading_process(&self) {
        let count = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.publish(count);
    }

    fn remove_loading_process(&self) {
        let prev = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
            .unwrap_or(0);
        self.publish(prev.saturating_sub(1));
    }
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
