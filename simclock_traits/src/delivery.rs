//! One-slot, lossy time-event channels.
//!
//! Timer and ticker events travel through `bounded(1)` channels and are
//! sent without blocking: when the slot still holds an undelivered value,
//! the new one is dropped. Whatever advances time therefore never blocks on
//! a slow consumer.

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, Sender, bounded};

/// Creates the one-slot channel used for timer and ticker deliveries.
pub fn time_channel() -> (Sender<DateTime<Utc>>, Receiver<DateTime<Utc>>) {
    bounded(1)
}

/// Non-blocking send of `t` on a time channel. The value is dropped when
/// the slot is full or the receiver is gone.
pub fn send_time(tx: &Sender<DateTime<Utc>>, t: DateTime<Utc>) {
    let _ = tx.try_send(t);
}
