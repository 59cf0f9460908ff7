// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named-subscriber signals.
//!
//! Every element event is a [`Signal`]: a map from subscriber id to
//! callback. Subscribing under an existing id replaces the previous
//! callback, which is what makes re-wiring after a tree rebuild idempotent.
//!
//! Handlers may be invoked from worker threads during the parallel phases
//! of a frame, so they must be `Send + Sync`; hosts that need to reach
//! thread-bound resources should enqueue into their own channel and drain
//! it on their own timeline.

use std::sync::Arc;

use parking_lot::RwLock;

type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// A synchronously emitted event with named subscribers.
pub struct Signal<A> {
    subscribers: RwLock<Vec<(String, Callback<A>)>>,
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> core::fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

impl<A> Signal<A> {
    /// Create a signal with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe under `id`, replacing any previous subscription with the
    /// same id.
    pub fn subscribe(&self, id: impl Into<String>, callback: impl Fn(&A) + Send + Sync + 'static) {
        let id = id.into();
        let mut subscribers = self.subscribers.write();
        if let Some(slot) = subscribers.iter_mut().find(|(existing, _)| *existing == id) {
            slot.1 = Arc::new(callback);
        } else {
            subscribers.push((id, Arc::new(callback)));
        }
    }

    /// Remove the subscription with the given id. Returns whether one
    /// existed.
    pub fn unsubscribe(&self, id: &str) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(existing, _)| existing != id);
        subscribers.len() != before
    }

    /// The number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Whether the signal has no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.read().is_empty()
    }

    /// Invoke every subscriber with `args`, synchronously, in subscription
    /// order.
    pub fn emit(&self, args: &A) {
        // Snapshot so a handler can (un)subscribe without deadlocking.
        let snapshot: Vec<Callback<A>> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for callback in snapshot {
            callback(args);
        }
    }
}
