//! Observer channels fed when a waiter of a given kind is created.

use chrono::TimeDelta;
use crossbeam_channel::Sender;

/// Registry of observer channels for one waiter kind.
///
/// `notify` uses a blocking send: test code that registers a channel must
/// service it promptly, or the call creating the waiter stalls until it
/// does.
#[derive(Default)]
pub(crate) struct Notifiers {
    channels: Vec<Sender<TimeDelta>>,
}

impl Notifiers {
    /// Adds an observer channel. Idempotent: re-adding a channel already
    /// present does nothing.
    pub(crate) fn add(&mut self, tx: Sender<TimeDelta>) {
        if !self.channels.iter().any(|c| c.same_channel(&tx)) {
            self.channels.push(tx);
        }
    }

    /// Removes an observer channel. Idempotent: removing an absent channel
    /// does nothing.
    pub(crate) fn remove(&mut self, tx: &Sender<TimeDelta>) {
        self.channels.retain(|c| !c.same_channel(tx));
    }

    /// Sends `d` to every observer in registration order, blocking until
    /// each accepts it. Observers whose receiver is gone can never be
    /// serviced again and are dropped from the registry.
    pub(crate) fn notify(&mut self, d: TimeDelta) {
        self.channels.retain(|c| c.send(d).is_ok());
    }
}
