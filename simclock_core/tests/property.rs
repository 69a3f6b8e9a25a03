//! Property tests over arbitrary advance sequences.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use proptest::prelude::*;
use simclock_core::{Clock, FakeClock, Ticker, Timer};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

proptest! {
    /// Whatever the advance pattern, a ticker only ever yields instants of
    /// the form `start + k * period`, with strictly increasing `k`.
    #[test]
    fn ticker_yields_whole_periods_in_order(
        steps in prop::collection::vec(1i64..500, 1..40),
        period_ms in 1i64..200,
    ) {
        let clock = FakeClock::new(start());
        let ticker = clock.new_ticker(TimeDelta::milliseconds(period_ms));
        let rx = ticker.channel();
        let mut last_k = 0i64;

        for step in steps {
            clock.add(TimeDelta::milliseconds(step));
            while let Ok(t) = rx.try_recv() {
                let offset_ms = (t - start()).num_milliseconds();
                prop_assert!(offset_ms > 0);
                prop_assert_eq!(offset_ms % period_ms, 0, "tick off the period grid");
                let k = offset_ms / period_ms;
                prop_assert!(k > last_k, "tick instants must strictly increase");
                last_k = k;
            }
        }
    }

    /// A timer delivers exactly once iff the clock reached its target, and
    /// never before.
    #[test]
    fn timer_fires_exactly_once_iff_due(
        steps in prop::collection::vec(0i64..100, 1..30),
        target_ms in 1i64..300,
    ) {
        let clock = FakeClock::new(start());
        let timer = clock.new_timer(TimeDelta::milliseconds(target_ms));
        let rx = timer.channel().expect("channel-mode timer");
        let mut fired = 0u32;

        for step in steps {
            clock.add(TimeDelta::milliseconds(step));
            while rx.try_recv().is_ok() {
                fired += 1;
            }
        }

        let due = clock.since(start()) >= TimeDelta::milliseconds(target_ms);
        prop_assert_eq!(fired, u32::from(due));
    }

    /// `add` and `since` agree over any signed step sequence.
    #[test]
    fn add_and_since_agree(steps in prop::collection::vec(-1_000i64..1_000, 1..50)) {
        let clock = FakeClock::new(start());
        let mut total = 0i64;
        for step in steps {
            clock.add(TimeDelta::milliseconds(step));
            total += step;
        }
        prop_assert_eq!(clock.since(start()), TimeDelta::milliseconds(total));
        prop_assert_eq!(clock.until(start()), TimeDelta::milliseconds(-total));
    }
}
