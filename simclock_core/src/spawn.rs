//! Deferred and periodic callback tasks driven by any [`Clock`].
//!
//! Each helper spawns a worker thread that waits on a timer or ticker
//! channel and a cancel signal, and invokes the callback for whichever
//! happens. The callback can tell the cases apart through its [`Wake`]
//! argument and do its cleanup on cancellation. Dropping the returned
//! [`SpawnHandle`] cancels the task and joins the worker, so tasks never
//! outlive the scope that created them.

use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel::{Sender, bounded, select};
use simclock_traits::{Clock, Ticker, Timer};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Why a spawned callback ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The timer or ticker fired at the given instant.
    Fired(DateTime<Utc>),
    /// The task was canceled, or its clock went away, before firing.
    Canceled,
}

/// Cancellation handle for a spawned callback task.
///
/// Canceling — explicitly via [`cancel`](SpawnHandle::cancel) or by
/// dropping the handle — signals the worker and joins it.
pub struct SpawnHandle {
    cancel: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SpawnHandle {
    fn new(cancel: Sender<()>, worker: JoinHandle<()>) -> Self {
        Self {
            cancel: Some(cancel),
            worker: Some(worker),
        }
    }

    /// Cancels the task and waits for the worker to finish. If the callback
    /// had not already completed, it observes [`Wake::Canceled`] exactly
    /// once.
    pub fn cancel(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // dropping the sender is the signal: the worker's cancel arm fires
        // on disconnect
        self.cancel.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("spawned clock task panicked");
            }
            debug!("spawned clock task joined");
        }
    }
}

impl Drop for SpawnHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Invokes `f` once: either when `d` elapses on `clock`, or when the task
/// is canceled first.
pub fn spawn_after<C, F>(clock: &C, d: TimeDelta, f: F) -> SpawnHandle
where
    C: Clock,
    F: FnOnce(Wake) + Send + 'static,
{
    let events = clock.new_timer(d).channel();
    let (cancel_tx, cancel_rx) = bounded::<()>(0);

    let worker = thread::spawn(move || {
        let Some(events) = events else {
            // new_timer always yields a channel-mode timer
            f(Wake::Canceled);
            return;
        };
        select! {
            recv(events) -> msg => match msg {
                Ok(t) => f(Wake::Fired(t)),
                Err(_) => f(Wake::Canceled), // clock went away
            },
            recv(cancel_rx) -> _ => f(Wake::Canceled),
        }
    });

    SpawnHandle::new(cancel_tx, worker)
}

/// Invokes `f` on every tick of a `d`-period ticker created on `clock`,
/// until the task is canceled; cancellation invokes `f(Wake::Canceled)`
/// once so the callback can clean up. Stopping the returned ticker pauses
/// invocations without ending the task; resetting it resumes them.
///
/// # Panics
///
/// Panics when `d` is zero or negative, as `new_ticker` does.
pub fn spawn_every<C, F>(clock: &C, d: TimeDelta, mut f: F) -> (C::Ticker, SpawnHandle)
where
    C: Clock,
    F: FnMut(Wake) + Send + 'static,
{
    let ticker = clock.new_ticker(d);
    let ticks = ticker.channel();
    let (cancel_tx, cancel_rx) = bounded::<()>(0);

    let worker = thread::spawn(move || {
        loop {
            select! {
                recv(ticks) -> msg => match msg {
                    Ok(t) => f(Wake::Fired(t)),
                    Err(_) => {
                        // clock went away
                        f(Wake::Canceled);
                        break;
                    }
                },
                recv(cancel_rx) -> _ => {
                    f(Wake::Canceled);
                    break;
                }
            }
        }
    });

    (ticker, SpawnHandle::new(cancel_tx, worker))
}
