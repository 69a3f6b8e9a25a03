//! One-shot timer backed by a worker thread.

use crate::to_std_clamped;
use chrono::{DateTime, TimeDelta, Utc};
use crossbeam_channel as xch;
use crossbeam_channel::{Receiver, Sender, never, select};
use simclock_traits::{Timer, send_time, time_channel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

enum Ctrl {
    Reset(Duration),
    Stop,
}

enum Output {
    Channel(Sender<DateTime<Utc>>),
    Func(Box<dyn FnMut() + Send>),
}

/// One-shot timer that fires on the host clock.
///
/// A worker thread owns the deadline and delivers `Utc::now()` into a
/// one-slot channel (or invokes the callback) when it expires. The worker
/// exits once the handle is gone and no fire is pending.
///
/// `reset`/`stop` report "was active" on a best-effort basis: the same
/// inherent race every wall-clock timer API has applies here, since the
/// worker may be firing while the call is made.
pub struct SystemTimer {
    chan: Option<Receiver<DateTime<Utc>>>,
    ctrl: Sender<Ctrl>,
    active: Arc<AtomicBool>,
}

impl SystemTimer {
    /// Starts a channel-mode timer, returning the handle and its receiver.
    pub(crate) fn channel_mode(d: TimeDelta) -> (Self, Receiver<DateTime<Utc>>) {
        let (tx, rx) = time_channel();
        let timer = Self::start(d, Output::Channel(tx), Some(rx.clone()));
        (timer, rx)
    }

    /// Starts a callback-mode timer; its `channel()` reports `None`.
    pub(crate) fn func_mode<F>(d: TimeDelta, f: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        Self::start(d, Output::Func(Box::new(f)), None)
    }

    fn start(d: TimeDelta, output: Output, chan: Option<Receiver<DateTime<Utc>>>) -> Self {
        let (ctrl_tx, ctrl_rx) = xch::unbounded();
        let active = Arc::new(AtomicBool::new(true));
        let worker_active = Arc::clone(&active);
        let initial = to_std_clamped(d);

        std::thread::spawn(move || run_worker(&ctrl_rx, &worker_active, initial, output));

        Self {
            chan,
            ctrl: ctrl_tx,
            active,
        }
    }
}

impl Timer for SystemTimer {
    fn channel(&self) -> Option<Receiver<DateTime<Utc>>> {
        self.chan.clone()
    }

    fn reset(&self, d: TimeDelta) -> bool {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        let _ = self.ctrl.send(Ctrl::Reset(to_std_clamped(d)));
        was_active
    }

    fn stop(&self) -> bool {
        let was_active = self.active.swap(false, Ordering::SeqCst);
        let _ = self.ctrl.send(Ctrl::Stop);
        was_active
    }
}

fn run_worker(ctrl: &Receiver<Ctrl>, active: &AtomicBool, initial: Duration, mut output: Output) {
    let mut deadline = Some(Instant::now() + initial);
    let mut ctrl_open = true;

    loop {
        if !ctrl_open && deadline.is_none() {
            tracing::trace!("timer handle gone with nothing pending; worker exiting");
            return;
        }

        let ctrl_arm = if ctrl_open { ctrl.clone() } else { never() };
        let fire_arm = match deadline {
            Some(at) => xch::after(at.saturating_duration_since(Instant::now())),
            None => never(),
        };

        select! {
            recv(ctrl_arm) -> msg => match msg {
                Ok(Ctrl::Reset(d)) => deadline = Some(Instant::now() + d),
                Ok(Ctrl::Stop) => deadline = None,
                Err(_) => ctrl_open = false,
            },
            recv(fire_arm) -> _ => {
                deadline = None;
                active.store(false, Ordering::SeqCst);
                match &mut output {
                    Output::Channel(tx) => send_time(tx, Utc::now()),
                    Output::Func(f) => f(),
                }
            }
        }
    }
}
