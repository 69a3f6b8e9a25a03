#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Manually-advanced virtual clock for deterministic concurrent tests.
//!
//! Production code takes a generic `C: Clock` (see `simclock_traits`) and is
//! driven by `simclock_system::SystemClock` in deployment. Under test it is
//! handed a [`FakeClock`] instead, whose time moves only when the test calls
//! [`FakeClock::add`] or [`FakeClock::set`].
//!
//! ## Architecture
//!
//! - **Clock core** (`clock`): current virtual time plus the waiter registry
//!   behind a single lock. A time update runs one synchronous dispatch pass
//!   over every registered waiter before the lock is released, so no thread
//!   can observe the new time before every then-due waiter has been offered
//!   its event.
//! - **Waiters**: one-shot timers (`timer`), repeating tickers (`ticker`),
//!   and blocked sleepers (`sleeper`), registered as listeners and fired by
//!   the dispatch pass.
//! - **Observation** (`notify`): per-kind observer channels that tell test
//!   code when a waiter was created, so tests can synchronize with the code
//!   under test before advancing time.
//! - **Spawn layer** (`spawn`): worker threads that run a callback when a
//!   timer or ticker fires, or when the task is canceled.
//!
//! Events are delivered into one-slot channels without blocking; see
//! `simclock_traits::delivery` for the lossy-send contract.

pub mod clock;
mod listener;
mod notify;
pub mod sleeper;
pub mod spawn;
pub mod ticker;
pub mod timer;
mod util;

pub use clock::FakeClock;
pub use simclock_traits::{Clock, Ticker, Timer};
pub use sleeper::FakeSleeper;
pub use spawn::{SpawnHandle, Wake, spawn_after, spawn_every};
pub use ticker::FakeTicker;
pub use timer::FakeTimer;
