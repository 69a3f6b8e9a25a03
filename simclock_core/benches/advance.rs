use chrono::{TimeDelta, TimeZone, Utc};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use simclock_core::{Clock, FakeClock};

/// One dispatch pass over a populated registry: 100 pending timers plus a
/// handful of tickers, half of them becoming due.
fn advance_dispatch(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

    c.bench_function("add_with_100_timers", |b| {
        b.iter_batched(
            || {
                let clock = FakeClock::new(start);
                let timers: Vec<_> = (1..=100)
                    .map(|i| clock.new_timer(TimeDelta::milliseconds(i)))
                    .collect();
                (clock, timers)
            },
            |(clock, _timers)| clock.add(TimeDelta::milliseconds(50)),
            BatchSize::SmallInput,
        );
    });

    c.bench_function("add_with_8_tickers", |b| {
        b.iter_batched(
            || {
                let clock = FakeClock::new(start);
                let tickers: Vec<_> = (1..=8)
                    .map(|i| clock.new_ticker(TimeDelta::milliseconds(i)))
                    .collect();
                (clock, tickers)
            },
            |(clock, _tickers)| clock.add(TimeDelta::milliseconds(64)),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, advance_dispatch);
criterion_main!(benches);
