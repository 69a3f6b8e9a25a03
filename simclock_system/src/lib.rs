//! Pass-through [`Clock`] implementation backed by the host's time
//! facilities.
//!
//! [`SystemClock`] forwards `now` and `sleep` straight to the operating
//! system. The standard library has no timer or ticker objects, so
//! [`SystemTimer`] and [`SystemTicker`] are built from a worker thread that
//! waits out the interval on a crossbeam `after` channel and delivers into
//! the usual one-slot time channel. Workers detach rather than joining on
//! drop: `after()`-style use drops the handle while the fire is still
//! pending, and the fire must still happen.

pub mod ticker;
pub mod timer;

pub use ticker::SystemTicker;
pub use timer::SystemTimer;

use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel::Receiver;
use simclock_traits::Clock;

/// Clock backed by the host's wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl SystemClock {
    #[inline]
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    type Timer = SystemTimer;
    type Ticker = SystemTicker;

    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep(&self, d: TimeDelta) {
        // zero and negative durations return immediately
        if let Ok(d) = d.to_std()
            && !d.is_zero()
        {
            std::thread::sleep(d);
        }
    }

    fn after(&self, d: TimeDelta) -> Receiver<DateTime<Utc>> {
        let (timer, rx) = SystemTimer::channel_mode(d);
        // the worker keeps the pending fire alive without the handle
        drop(timer);
        rx
    }

    fn after_func<F>(&self, d: TimeDelta, f: F) -> SystemTimer
    where
        F: FnMut() + Send + 'static,
    {
        SystemTimer::func_mode(d, f)
    }

    fn tick(&self, d: TimeDelta) -> Receiver<DateTime<Utc>> {
        let ticker = SystemTicker::start(d);
        ticker.receiver()
    }

    fn new_timer(&self, d: TimeDelta) -> SystemTimer {
        let (timer, _rx) = SystemTimer::channel_mode(d);
        timer
    }

    fn new_ticker(&self, d: TimeDelta) -> SystemTicker {
        SystemTicker::start(d)
    }
}

/// Clamps a signed delta to a std duration for host-side scheduling; zero
/// and negative deltas become an immediate deadline.
pub(crate) fn to_std_clamped(d: TimeDelta) -> std::time::Duration {
    d.to_std().unwrap_or(std::time::Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_tracks_host_clock() {
        let clock = SystemClock::new();
        let before = Utc::now();
        let observed = clock.now();
        let after = Utc::now();
        assert!(observed >= before);
        assert!(observed <= after);
    }

    #[test]
    fn since_and_until_are_signed() {
        let clock = SystemClock::new();
        let past = clock.now() - TimeDelta::seconds(10);
        assert!(clock.since(past) >= TimeDelta::seconds(10));
        assert!(clock.until(past) <= TimeDelta::seconds(-10));
    }

    #[test]
    fn to_std_clamped_floors_negative() {
        assert_eq!(
            to_std_clamped(TimeDelta::seconds(-1)),
            std::time::Duration::ZERO
        );
        assert_eq!(
            to_std_clamped(TimeDelta::milliseconds(25)),
            std::time::Duration::from_millis(25)
        );
    }
}
