//! Repeating virtual ticker.

use crate::clock::ClockInner;
use crate::listener::{Advance, Waiter};
use crate::util::equal_or_after;
use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use simclock_traits::{Ticker, send_time, time_channel};
use std::sync::Arc;

pub(crate) struct TickerState {
    period: TimeDelta,
    /// Earliest instant at which the next tick fires. Only ever moves
    /// forward, by whole periods, so an instant already fired for is never
    /// fired for again — even after the clock is set backward.
    next: DateTime<Utc>,
}

/// Shared ticker state.
pub(crate) struct TickerCore {
    tx: Sender<DateTime<Utc>>,
    rx: Receiver<DateTime<Utc>>,
    state: Mutex<TickerState>,
}

impl TickerCore {
    /// Callers guarantee `period > 0`.
    pub(crate) fn new(period: TimeDelta, start: DateTime<Utc>) -> Self {
        let (tx, rx) = time_channel();
        Self {
            tx,
            rx,
            state: Mutex::new(TickerState {
                period,
                next: start + period,
            }),
        }
    }

    pub(crate) fn on_advance(&self, now: DateTime<Utc>) -> Advance {
        let mut st = self.state.lock();
        // Walk the schedule up to `now`, then deliver the newest covered
        // tick; the older ones are dropped, but the schedule still catches
        // up, so the next tick lands one whole period later.
        let mut newest = None;
        while equal_or_after(now, st.next) {
            newest = Some(st.next);
            st.next = st.next + st.period;
        }
        if let Some(due) = newest {
            send_time(&self.tx, due);
        }
        // a ticker never expires on its own; it has to be stopped
        Advance::Continue
    }
}

/// Ticker driven by a [`FakeClock`](crate::FakeClock).
///
/// Handles are cheap clones over shared state; every state-affecting method
/// serializes on the owning clock's lock.
#[derive(Clone)]
pub struct FakeTicker {
    pub(crate) clock: Arc<ClockInner>,
    pub(crate) core: Arc<TickerCore>,
}

impl FakeTicker {
    fn as_waiter(&self) -> Waiter {
        Waiter::Ticker(Arc::clone(&self.core))
    }

    /// The earliest instant at which the next tick fires.
    pub fn when(&self) -> DateTime<Utc> {
        self.core.state.lock().next
    }

    /// Forces a tick carrying the next-due instant, without consuming
    /// virtual time or advancing the schedule. Repeated calls therefore
    /// deliver the same timestamp; advance the clock instead when the tick
    /// value matters. The tick is delivered even when the ticker is
    /// stopped; the return value reports whether it was active.
    pub fn fire(&self) -> bool {
        self.clock.with_state(|state| {
            let st = self.core.state.lock();
            send_time(&self.core.tx, st.next);
            drop(st);
            state.listeners.contains(&self.as_waiter())
        })
    }
}

impl Ticker for FakeTicker {
    fn channel(&self) -> Receiver<DateTime<Utc>> {
        self.core.rx.clone()
    }

    fn reset(&self, d: TimeDelta) {
        assert!(
            d > TimeDelta::zero(),
            "non-positive interval for FakeTicker"
        );
        self.clock.with_state(|state| {
            let mut st = self.core.state.lock();
            st.period = d;
            st.next = state.now + d;
            drop(st);
            // idempotent: also reactivates a stopped ticker
            state.listeners.add(self.as_waiter());
        });
    }

    fn stop(&self) {
        self.clock.with_state(|state| {
            state.listeners.remove(&self.as_waiter());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn not_due_delivers_nothing() {
        let core = TickerCore::new(TimeDelta::seconds(10), start());
        assert_eq!(
            core.on_advance(start() + TimeDelta::seconds(9)),
            Advance::Continue
        );
        assert!(core.rx.try_recv().is_err());
    }

    #[test]
    fn delivers_the_due_tick() {
        let core = TickerCore::new(TimeDelta::seconds(10), start());
        core.on_advance(start() + TimeDelta::seconds(10));
        assert_eq!(
            core.rx.try_recv().unwrap(),
            start() + TimeDelta::seconds(10)
        );
    }

    #[test]
    fn catch_up_delivers_newest_and_advances_schedule() {
        let core = TickerCore::new(TimeDelta::seconds(10), start());
        // jump across three periods: one tick, carrying the newest instant
        core.on_advance(start() + TimeDelta::seconds(35));
        assert_eq!(
            core.rx.try_recv().unwrap(),
            start() + TimeDelta::seconds(30)
        );
        assert!(core.rx.try_recv().is_err());

        // the schedule caught up: next fires at 40s
        core.on_advance(start() + TimeDelta::seconds(40));
        assert_eq!(
            core.rx.try_recv().unwrap(),
            start() + TimeDelta::seconds(40)
        );
    }

    #[test]
    fn never_refires_an_instant_after_backward_move() {
        let core = TickerCore::new(TimeDelta::seconds(10), start());
        core.on_advance(start() + TimeDelta::seconds(10));
        assert!(core.rx.try_recv().is_ok());

        // moving backward and returning to the same instant is silent
        core.on_advance(start());
        core.on_advance(start() + TimeDelta::seconds(10));
        assert!(core.rx.try_recv().is_err());
    }
}
