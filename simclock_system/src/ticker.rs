//! Repeating ticker backed by a worker thread.

use crate::to_std_clamped;
use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel as xch;
use crossbeam_channel::{Receiver, Sender, TrySendError, never, select};
use simclock_traits::{Ticker, time_channel};
use std::time::{Duration, Instant};

enum Ctrl {
    Reset(Duration),
    Stop,
}

/// Ticker that fires on the host clock.
///
/// A worker thread delivers `Utc::now()` into a one-slot channel on every
/// period boundary, skipping periods the consumer slept through. The worker
/// keeps ticking after the handle is dropped for as long as a receiver
/// exists (ticks must keep flowing for `tick()`-style use); it exits once
/// the handle and every receiver are gone.
pub struct SystemTicker {
    chan: Receiver<DateTime<Utc>>,
    ctrl: Sender<Ctrl>,
}

impl SystemTicker {
    /// Starts a ticker with the given period.
    ///
    /// # Panics
    ///
    /// Panics when `period` is zero or negative.
    pub(crate) fn start(period: TimeDelta) -> Self {
        assert!(
            period > TimeDelta::zero(),
            "non-positive interval for SystemTicker"
        );

        let (tx, rx) = time_channel();
        let (ctrl_tx, ctrl_rx) = xch::unbounded();
        let p = to_std_clamped(period);

        std::thread::spawn(move || run_worker(&ctrl_rx, &tx, p));

        Self {
            chan: rx,
            ctrl: ctrl_tx,
        }
    }

    /// A receive handle on the tick channel.
    pub(crate) fn receiver(&self) -> Receiver<DateTime<Utc>> {
        self.chan.clone()
    }
}

impl Ticker for SystemTicker {
    fn channel(&self) -> Receiver<DateTime<Utc>> {
        self.chan.clone()
    }

    fn reset(&self, d: TimeDelta) {
        assert!(
            d > TimeDelta::zero(),
            "non-positive interval for SystemTicker"
        );
        let _ = self.ctrl.send(Ctrl::Reset(to_std_clamped(d)));
    }

    fn stop(&self) {
        let _ = self.ctrl.send(Ctrl::Stop);
    }
}

fn run_worker(ctrl: &Receiver<Ctrl>, tx: &Sender<DateTime<Utc>>, mut period: Duration) {
    let mut next = Instant::now() + period;
    let mut running = true;
    let mut ctrl_open = true;

    loop {
        if !ctrl_open && !running {
            // stopped with the handle gone: nobody can restart it
            tracing::trace!("ticker stopped and handle gone; worker exiting");
            return;
        }

        let ctrl_arm = if ctrl_open { ctrl.clone() } else { never() };
        let tick_arm = if running {
            xch::after(next.saturating_duration_since(Instant::now()))
        } else {
            never()
        };

        select! {
            recv(ctrl_arm) -> msg => match msg {
                Ok(Ctrl::Reset(p)) => {
                    period = p;
                    next = Instant::now() + p;
                    running = true;
                }
                Ok(Ctrl::Stop) => running = false,
                Err(_) => ctrl_open = false,
            },
            recv(tick_arm) -> _ => {
                if let Err(TrySendError::Disconnected(_)) = tx.try_send(Utc::now()) {
                    tracing::trace!("tick receivers gone; worker exiting");
                    return;
                }
                next += period;
                // skip periods that already elapsed while the slot was full
                // or the host was busy
                let now = Instant::now();
                while next <= now {
                    next += period;
                }
            }
        }
    }
}
