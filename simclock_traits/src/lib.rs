//! Time-source abstraction shared by the real and virtual clocks.
//!
//! Production code takes a generic `C: Clock` and never touches the system
//! time directly. In deployment that `C` is `simclock_system::SystemClock`;
//! under test it is `simclock_core::FakeClock`, whose time moves only when
//! the test says so.

pub mod clock;
pub mod delivery;

pub use clock::{Clock, Ticker, Timer};
pub use delivery::{send_time, time_channel};
