//! The manually-advanced virtual clock.

use crate::listener::{Advance, Listeners, Waiter};
use crate::notify::Notifiers;
use crate::sleeper::{FakeSleeper, SleeperCore};
use crate::ticker::{FakeTicker, TickerCore};
use crate::timer::{Delivery, FakeTimer, TimerCore};
use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::RwLock;
use simclock_traits::{Clock, Ticker as _, time_channel};
use std::sync::Arc;
use tracing::trace;

/// Everything the clock's lock guards: the current virtual time, the waiter
/// registry, and the per-kind creation observers.
pub(crate) struct ClockState {
    pub(crate) now: DateTime<Utc>,
    pub(crate) listeners: Listeners,
    on_sleep: Notifiers,
    on_timer: Notifiers,
    on_ticker: Notifiers,
}

pub(crate) struct ClockInner {
    state: RwLock<ClockState>,
}

impl ClockInner {
    /// Runs `f` with exclusive access to the clock state. Waiter handles
    /// route every state-affecting method through here so that all
    /// mutations share the clock's single serialization point.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut ClockState) -> R) -> R {
        f(&mut self.state.write())
    }
}

/// A [`Clock`] whose time stands still until the owning test moves it.
///
/// All state-affecting operations — [`add`](FakeClock::add) and
/// [`set`](FakeClock::set), waiter creation, and every method on the
/// handles a `FakeClock` gives out — serialize on one internal lock, and a
/// time update dispatches synchronously to every registered waiter before
/// the lock is released. No thread can observe the new time without every
/// then-due waiter having been offered its event first.
///
/// Callbacks passed to `after_func` run inside that locked region: they
/// must not block and must not call back into the clock or its handles, or
/// the calling thread deadlocks.
///
/// A `FakeClock` is a cheap clone over shared state, so it can be handed to
/// the code under test while the test keeps driving the original. Separate
/// `FakeClock` instances share nothing.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<ClockInner>,
}

impl FakeClock {
    /// Creates a clock whose current time is `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            inner: Arc::new(ClockInner {
                state: RwLock::new(ClockState {
                    now: start,
                    listeners: Listeners::default(),
                    on_sleep: Notifiers::default(),
                    on_timer: Notifiers::default(),
                    on_ticker: Notifiers::default(),
                }),
            }),
        }
    }

    /// Moves the current time by `d` — negative and zero deltas are allowed
    /// — then dispatches once to every registered waiter, atomically with
    /// respect to every other method. Returns the new current time.
    pub fn add(&self, d: TimeDelta) -> DateTime<Utc> {
        self.inner.with_state(|state| {
            let now = state.now + d;
            state.now = now;
            trace!(%now, listeners = state.listeners.len(), "fake clock advanced");
            state.listeners.on_advance(now);
            now
        })
    }

    /// Sets the current time to the absolute instant `t` — moving backward
    /// is allowed — with the same dispatch semantics as
    /// [`add`](FakeClock::add).
    pub fn set(&self, t: DateTime<Utc>) {
        self.inner.with_state(|state| {
            state.now = t;
            trace!(now = %t, listeners = state.listeners.len(), "fake clock set");
            state.listeners.on_advance(t);
        });
    }

    /// Registers an observer that receives the duration of every subsequent
    /// `sleep` call, before the sleeping thread blocks. Idempotent.
    ///
    /// The notification send blocks: an unserviced observer stalls the
    /// sleeping thread until the observer catches up.
    pub fn notify_on_sleep(&self, tx: Sender<TimeDelta>) {
        self.inner.with_state(|state| state.on_sleep.add(tx));
    }

    /// Removes a sleep observer. Idempotent.
    pub fn stop_on_sleep(&self, tx: &Sender<TimeDelta>) {
        self.inner.with_state(|state| state.on_sleep.remove(tx));
    }

    /// Registers an observer that receives the duration of every subsequent
    /// timer creation (`new_timer`, `after`, `after_func`), before the
    /// creating call returns. Idempotent. The send blocks as for
    /// [`notify_on_sleep`](FakeClock::notify_on_sleep).
    pub fn notify_on_timer(&self, tx: Sender<TimeDelta>) {
        self.inner.with_state(|state| state.on_timer.add(tx));
    }

    /// Removes a timer observer. Idempotent.
    pub fn stop_on_timer(&self, tx: &Sender<TimeDelta>) {
        self.inner.with_state(|state| state.on_timer.remove(tx));
    }

    /// Registers an observer that receives the interval of every subsequent
    /// ticker creation (`new_ticker`, `tick`), before the creating call
    /// returns. Idempotent. The send blocks as for
    /// [`notify_on_sleep`](FakeClock::notify_on_sleep).
    pub fn notify_on_ticker(&self, tx: Sender<TimeDelta>) {
        self.inner.with_state(|state| state.on_ticker.add(tx));
    }

    /// Removes a ticker observer. Idempotent.
    pub fn stop_on_ticker(&self, tx: &Sender<TimeDelta>) {
        self.inner.with_state(|state| state.on_ticker.remove(tx));
    }

    /// Snapshot of the sleepers currently blocked on this clock, in
    /// registration order. Pair with
    /// [`notify_on_sleep`](FakeClock::notify_on_sleep) to know when the
    /// sleeper being waited for has appeared.
    pub fn sleepers(&self) -> Vec<FakeSleeper> {
        let state = self.inner.state.read();
        state
            .listeners
            .sleepers()
            .into_iter()
            .map(|core| FakeSleeper {
                clock: Arc::clone(&self.inner),
                core,
            })
            .collect()
    }

    /// Creates a timer at `now + d`, runs its initial advance callback so a
    /// non-positive `d` fires before this call returns (and is never
    /// registered), and notifies timer observers.
    fn start_timer(
        &self,
        d: TimeDelta,
        delivery: Delivery,
        chan: Option<Receiver<DateTime<Utc>>>,
    ) -> FakeTimer {
        self.inner.with_state(|state| {
            let core = Arc::new(TimerCore::new(state.now + d, delivery, chan));
            if core.on_advance(state.now) == Advance::Continue {
                state.listeners.add(Waiter::Timer(Arc::clone(&core)));
            }
            state.on_timer.notify(d);
            FakeTimer {
                clock: Arc::clone(&self.inner),
                core,
            }
        })
    }
}

impl Clock for FakeClock {
    type Timer = FakeTimer;
    type Ticker = FakeTicker;

    fn now(&self) -> DateTime<Utc> {
        self.inner.state.read().now
    }

    fn since(&self, t: DateTime<Utc>) -> TimeDelta {
        self.inner.state.read().now - t
    }

    fn until(&self, t: DateTime<Utc>) -> TimeDelta {
        t - self.inner.state.read().now
    }

    fn sleep(&self, d: TimeDelta) {
        if d <= TimeDelta::zero() {
            // consistent with a real sleep
            return;
        }

        let core = self.inner.with_state(|state| {
            let core = Arc::new(SleeperCore::new(state.now + d));
            state.listeners.add(Waiter::Sleeper(Arc::clone(&core)));
            state.on_sleep.notify(d);
            core
        });

        // block outside the lock, so the thread advancing time is never
        // left waiting on the sleeping one
        core.wait();
    }

    fn after(&self, d: TimeDelta) -> Receiver<DateTime<Utc>> {
        let (tx, rx) = time_channel();
        self.start_timer(d, Delivery::Channel(tx), Some(rx.clone()));
        rx
    }

    fn after_func<F>(&self, d: TimeDelta, mut f: F) -> FakeTimer
    where
        F: FnMut() + Send + 'static,
    {
        self.start_timer(d, Delivery::Func(Box::new(move |_| f())), None)
    }

    fn tick(&self, d: TimeDelta) -> Receiver<DateTime<Utc>> {
        self.new_ticker(d).channel()
    }

    fn new_timer(&self, d: TimeDelta) -> FakeTimer {
        let (tx, rx) = time_channel();
        self.start_timer(d, Delivery::Channel(tx), Some(rx))
    }

    fn new_ticker(&self, d: TimeDelta) -> FakeTicker {
        assert!(
            d > TimeDelta::zero(),
            "non-positive interval for FakeTicker"
        );
        self.inner.with_state(|state| {
            let core = Arc::new(TickerCore::new(d, state.now));
            state.listeners.add(Waiter::Ticker(Arc::clone(&core)));
            state.on_ticker.notify(d);
            FakeTicker {
                clock: Arc::clone(&self.inner),
                core,
            }
        })
    }
}
