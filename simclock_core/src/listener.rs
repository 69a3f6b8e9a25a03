//! Registry of waiters that respond to virtual-time updates.

use crate::sleeper::SleeperCore;
use crate::ticker::TickerCore;
use crate::timer::TimerCore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Outcome of a waiter's advance callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// Keep the waiter registered for future updates.
    Continue,
    /// The waiter is finished; drop it from the registry.
    Stop,
}

/// A registered waiter.
///
/// The set of variants is closed: callers cannot add waiter kinds, so a
/// tagged enum over the shared cores does the job of a trait object without
/// the identity-comparison contortions.
#[derive(Clone)]
pub(crate) enum Waiter {
    Sleeper(Arc<SleeperCore>),
    Timer(Arc<TimerCore>),
    Ticker(Arc<TickerCore>),
}

impl Waiter {
    /// Dispatches a time update to the underlying waiter.
    ///
    /// Always invoked while the owning clock's lock is held; the callback
    /// must not attempt to reacquire it.
    pub(crate) fn on_advance(&self, now: DateTime<Utc>) -> Advance {
        match self {
            Waiter::Sleeper(s) => s.on_advance(now),
            Waiter::Timer(t) => t.on_advance(now),
            Waiter::Ticker(t) => t.on_advance(now),
        }
    }

    /// Identity comparison: two waiters are the same when they share a core.
    fn same(&self, other: &Waiter) -> bool {
        match (self, other) {
            (Waiter::Sleeper(a), Waiter::Sleeper(b)) => Arc::ptr_eq(a, b),
            (Waiter::Timer(a), Waiter::Timer(b)) => Arc::ptr_eq(a, b),
            (Waiter::Ticker(a), Waiter::Ticker(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Mutable set of waiters, keyed by identity.
///
/// Insertion order is preserved only so dispatch and snapshots are
/// deterministic; semantically this is a set, not a sequence. Registries
/// stay small, so linear scans are the common case worth optimizing for.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Vec<Waiter>,
}

impl Listeners {
    /// Registers a waiter. Idempotent: re-adding a present waiter is a
    /// no-op.
    pub(crate) fn add(&mut self, w: Waiter) {
        if !self.contains(&w) {
            self.entries.push(w);
        }
    }

    /// Deregisters a waiter. Idempotent: removing an absent waiter is a
    /// no-op.
    pub(crate) fn remove(&mut self, w: &Waiter) {
        self.entries.retain(|e| !e.same(w));
    }

    pub(crate) fn contains(&self, w: &Waiter) -> bool {
        self.entries.iter().any(|e| e.same(w))
    }

    /// Visits every registered waiter exactly once with the new time and
    /// drops the ones that report completion.
    pub(crate) fn on_advance(&mut self, now: DateTime<Utc>) {
        self.entries
            .retain(|e| e.on_advance(now) == Advance::Continue);
    }

    /// Currently registered sleeper cores, in registration order.
    pub(crate) fn sleepers(&self) -> Vec<Arc<SleeperCore>> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                Waiter::Sleeper(s) => Some(Arc::clone(s)),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
