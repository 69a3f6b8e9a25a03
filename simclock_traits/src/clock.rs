use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel::Receiver;

/// Source of time for control and scheduling logic across the stack.
///
/// - `now()`: the clock's notion of the current instant
/// - `sleep()`: blocks until the clock believes the duration has elapsed
/// - `after()`/`tick()`: channel conveniences over `new_timer()`/`new_ticker()`
///
/// Implementations must be safe to share across threads; every method takes
/// `&self`.
pub trait Clock {
    /// One-shot timer type produced by this clock.
    type Timer: Timer;
    /// Repeating ticker type produced by this clock.
    type Ticker: Ticker;

    /// Returns this clock's notion of the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Signed duration from `t` to this clock's current time.
    /// Negative when `t` is in the future; never clamped.
    fn since(&self, t: DateTime<Utc>) -> TimeDelta {
        self.now() - t
    }

    /// Signed duration from this clock's current time to `t`.
    /// Negative when `t` is in the past; never clamped.
    fn until(&self, t: DateTime<Utc>) -> TimeDelta {
        t - self.now()
    }

    /// Blocks the calling thread until this clock believes `d` has elapsed.
    /// Returns immediately when `d` is zero or negative.
    fn sleep(&self, d: TimeDelta);

    /// Returns a channel that receives a single time value once `d` has
    /// elapsed. The underlying timer is not returned, so it cannot be
    /// stopped.
    fn after(&self, d: TimeDelta) -> Receiver<DateTime<Utc>>;

    /// Invokes `f` once `d` has elapsed. The returned timer can halt or
    /// reschedule the invocation; its `channel()` is always `None`.
    fn after_func<F>(&self, d: TimeDelta, f: F) -> Self::Timer
    where
        F: FnMut() + Send + 'static;

    /// Returns a channel that receives a time value every `d`. The
    /// underlying ticker is not returned, so it cannot be stopped.
    ///
    /// # Panics
    ///
    /// Panics when `d` is zero or negative.
    fn tick(&self, d: TimeDelta) -> Receiver<DateTime<Utc>>;

    /// Produces a timer that fires once, `d` from now.
    fn new_timer(&self, d: TimeDelta) -> Self::Timer;

    /// Produces a ticker that fires every `d`.
    ///
    /// # Panics
    ///
    /// Panics when `d` is zero or negative.
    fn new_ticker(&self, d: TimeDelta) -> Self::Ticker;
}

/// Source of a single time event at a set point in time.
///
/// The return-value contract of [`reset`](Timer::reset) and
/// [`stop`](Timer::stop) mirrors conventional timer APIs, including their
/// well-known sharp edges; see the method docs.
pub trait Timer {
    /// The delivery channel, or `None` for callback-mode timers created via
    /// [`Clock::after_func`]. Slow receivers miss events: the channel holds
    /// at most one undelivered value and further sends are dropped.
    fn channel(&self) -> Option<Receiver<DateTime<Utc>>>;

    /// Reschedules this timer to fire `d` from now. Returns whether the
    /// timer had been active (neither fired nor stopped) at the moment of
    /// the call.
    ///
    /// The return value carries all the caveats of conventional timer APIs:
    /// it cannot be used to reliably decide whether an event is already
    /// sitting undrained in the channel. Callers that need the channel
    /// empty must drain it themselves.
    fn reset(&self, d: TimeDelta) -> bool;

    /// Prevents this timer from firing if it has not already. Returns true
    /// when the timer was still active, false when it had already fired or
    /// been stopped. Does not retract an event already delivered.
    fn stop(&self) -> bool;
}

/// Source of time events that occur at a fixed interval.
pub trait Ticker {
    /// The delivery channel. Always present. Slow receivers miss ticks:
    /// the channel holds at most one undelivered value and further sends
    /// are dropped.
    fn channel(&self) -> Receiver<DateTime<Utc>>;

    /// Changes the interval and schedules the next tick `d` from now.
    /// Reactivates a stopped ticker.
    ///
    /// # Panics
    ///
    /// Panics when `d` is zero or negative.
    fn reset(&self, d: TimeDelta);

    /// Halts future ticks. Does not retract a tick already delivered.
    fn stop(&self);
}
