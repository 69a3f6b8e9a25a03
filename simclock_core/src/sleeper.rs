//! One-shot waiter backing a thread blocked in `FakeClock::sleep`.

use crate::clock::ClockInner;
use crate::listener::{Advance, Waiter};
use crate::util::equal_or_after;
use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared sleeper state.
///
/// Completion is signaled by dropping the sender side of a zero-capacity
/// channel: every waiter unblocks at once, and repeated triggers are
/// naturally no-ops because the sender can only be taken once.
pub(crate) struct SleeperCore {
    when: DateTime<Utc>,
    trigger: Mutex<Option<Sender<()>>>,
    awaken: Receiver<()>,
}

impl SleeperCore {
    pub(crate) fn new(when: DateTime<Utc>) -> Self {
        let (tx, rx) = bounded(0);
        Self {
            when,
            trigger: Mutex::new(Some(tx)),
            awaken: rx,
        }
    }

    pub(crate) fn when(&self) -> DateTime<Utc> {
        self.when
    }

    /// Signals completion. Returns true only for the call that actually
    /// triggered it.
    pub(crate) fn complete(&self) -> bool {
        self.trigger.lock().take().is_some()
    }

    pub(crate) fn on_advance(&self, now: DateTime<Utc>) -> Advance {
        if equal_or_after(now, self.when) {
            self.complete();
            Advance::Stop
        } else {
            Advance::Continue
        }
    }

    /// Blocks until completion is signaled. The channel never carries a
    /// value; `recv` returns once `complete` drops the sender.
    pub(crate) fn wait(&self) {
        let _ = self.awaken.recv();
    }
}

/// Handle to a thread blocked inside a `FakeClock::sleep` call, obtained
/// from [`FakeClock::sleepers`](crate::FakeClock::sleepers).
#[derive(Clone)]
pub struct FakeSleeper {
    pub(crate) clock: Arc<ClockInner>,
    pub(crate) core: Arc<SleeperCore>,
}

impl FakeSleeper {
    /// The instant at which the sleeping thread wakes up: the duration
    /// passed to `sleep` added to the clock's time at the call.
    pub fn when(&self) -> DateTime<Utc> {
        self.core.when()
    }

    /// Forces the sleeping thread awake, leaving both the clock's time and
    /// this sleeper's target untouched. Idempotent; returns true only for
    /// the call that performed the wakeup.
    ///
    /// When the clock's time should reflect the sleep having finished, use
    /// `FakeClock::set` with the value of [`when`](FakeSleeper::when)
    /// instead.
    pub fn wakeup(&self) -> bool {
        self.clock.with_state(|state| {
            let woke = self.core.complete();
            state
                .listeners
                .remove(&Waiter::Sleeper(Arc::clone(&self.core)));
            woke
        })
    }
}
