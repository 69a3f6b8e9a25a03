//! One-shot virtual timer.

use crate::clock::ClockInner;
use crate::listener::{Advance, Waiter};
use crate::util::equal_or_after;
use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use simclock_traits::{Timer, send_time};
use std::sync::Arc;

/// How a timer event leaves the clock: a one-slot channel or a callback.
pub(crate) enum Delivery {
    Channel(Sender<DateTime<Utc>>),
    Func(Box<dyn FnMut(DateTime<Utc>) + Send>),
}

pub(crate) struct TimerState {
    when: DateTime<Utc>,
    /// Set once a value has been delivered or the timer stopped, cleared by
    /// reset. `!fired` is exactly "registered with the clock".
    fired: bool,
    delivery: Delivery,
}

impl TimerState {
    fn deliver(&mut self, t: DateTime<Utc>) {
        match &mut self.delivery {
            Delivery::Channel(tx) => send_time(tx, t),
            Delivery::Func(f) => f(t),
        }
    }
}

/// Shared timer state.
///
/// Mutations happen under the owning clock's lock; the inner mutex exists
/// because the state is reachable from both the registry and the handle.
pub(crate) struct TimerCore {
    chan: Option<Receiver<DateTime<Utc>>>,
    state: Mutex<TimerState>,
}

impl TimerCore {
    pub(crate) fn new(
        when: DateTime<Utc>,
        delivery: Delivery,
        chan: Option<Receiver<DateTime<Utc>>>,
    ) -> Self {
        Self {
            chan,
            state: Mutex::new(TimerState {
                when,
                fired: false,
                delivery,
            }),
        }
    }

    pub(crate) fn on_advance(&self, now: DateTime<Utc>) -> Advance {
        let mut st = self.state.lock();
        if st.fired {
            // stale registration from before a stop
            return Advance::Stop;
        }
        if equal_or_after(now, st.when) {
            st.fired = true;
            st.deliver(now);
            return Advance::Stop;
        }
        Advance::Continue
    }
}

/// Timer driven by a [`FakeClock`](crate::FakeClock): it fires when the
/// clock's time reaches its target, or on demand through
/// [`fire`](FakeTimer::fire).
///
/// Handles are cheap clones over shared state; every state-affecting method
/// serializes on the owning clock's lock.
#[derive(Clone)]
pub struct FakeTimer {
    pub(crate) clock: Arc<ClockInner>,
    pub(crate) core: Arc<TimerCore>,
}

impl FakeTimer {
    fn as_waiter(&self) -> Waiter {
        Waiter::Timer(Arc::clone(&self.core))
    }

    /// The instant at which this timer fires. Affected by
    /// [`reset`](Timer::reset).
    pub fn when(&self) -> DateTime<Utc> {
        self.core.state.lock().when
    }

    /// Forces this timer to fire with its *target* instant, leaving the
    /// clock's time untouched. Returns false, and delivers nothing, when
    /// the timer had already fired or been stopped.
    pub fn fire(&self) -> bool {
        self.clock.with_state(|state| {
            let mut st = self.core.state.lock();
            if st.fired {
                return false;
            }
            st.fired = true;
            let when = st.when;
            st.deliver(when);
            drop(st);
            state.listeners.remove(&self.as_waiter());
            true
        })
    }
}

impl Timer for FakeTimer {
    fn channel(&self) -> Option<Receiver<DateTime<Utc>>> {
        self.core.chan.clone()
    }

    fn reset(&self, d: TimeDelta) -> bool {
        self.clock.with_state(|state| {
            let now = state.now;
            let mut st = self.core.state.lock();
            let was_active = !st.fired;
            st.when = now + d;
            st.fired = false;

            if equal_or_after(now, st.when) {
                // already due: deliver immediately, stay deregistered
                st.fired = true;
                st.deliver(now);
                drop(st);
                state.listeners.remove(&self.as_waiter());
            } else if !was_active {
                drop(st);
                state.listeners.add(self.as_waiter());
            }
            was_active
        })
    }

    fn stop(&self) -> bool {
        self.clock.with_state(|state| {
            let mut st = self.core.state.lock();
            let was_active = !st.fired;
            st.fired = true;
            drop(st);
            state.listeners.remove(&self.as_waiter());
            was_active
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use simclock_traits::time_channel;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn channel_core(when: DateTime<Utc>) -> (TimerCore, Receiver<DateTime<Utc>>) {
        let (tx, rx) = time_channel();
        let core = TimerCore::new(when, Delivery::Channel(tx), Some(rx.clone()));
        (core, rx)
    }

    #[test]
    fn not_due_continues_without_delivery() {
        let (core, rx) = channel_core(start() + TimeDelta::seconds(5));
        assert_eq!(
            core.on_advance(start() + TimeDelta::seconds(4)),
            Advance::Continue
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn due_delivers_new_now_once() {
        let (core, rx) = channel_core(start() + TimeDelta::seconds(5));
        let jumped_to = start() + TimeDelta::seconds(7);
        assert_eq!(core.on_advance(jumped_to), Advance::Stop);
        assert_eq!(rx.try_recv().unwrap(), jumped_to);

        // a stale second dispatch must not deliver again
        assert_eq!(
            core.on_advance(jumped_to + TimeDelta::seconds(1)),
            Advance::Stop
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn func_delivery_invokes_callback() {
        let (seen_tx, seen_rx) = crossbeam_channel::bounded(1);
        let core = TimerCore::new(
            start(),
            Delivery::Func(Box::new(move |t| {
                let _ = seen_tx.try_send(t);
            })),
            None,
        );
        assert_eq!(core.on_advance(start()), Advance::Stop);
        assert_eq!(seen_rx.try_recv().unwrap(), start());
    }
}
