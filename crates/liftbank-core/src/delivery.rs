//! Event correlation and actor notification.
//!
//! Rider events are fanned out to every rider whose locus matches the event.
//! Actors learn that their queue has something in it through a notification
//! channel: the engine holds the [`Notifier`], the actor's facade holds the
//! [`Notifications`] and awaits them. A signal carries no data, the queue in
//! the world is the only source of events.

use std::collections::VecDeque;

use futures::{
    StreamExt,
    channel::mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::{
    event::{ControllerEvent, RiderEvent},
    rider::RiderState,
    types::{Locus, RiderId},
};

/// Whether a rider at `locus` observes `event`.
///
/// Riders inside an elevator see only that elevator's events. Riders on a
/// floor see every event at that floor.
pub fn observes(locus: Locus, event: &RiderEvent) -> bool {
    match locus {
        Locus::InElevator(elevator) => event.elevator == Some(elevator),
        Locus::OnFloor(floor) => event.floor == floor,
    }
}

/// Append `event` to the queue of every unfinished rider that observes it.
///
/// Returns the recipients in rider order.
pub(crate) fn fan_out(riders: &mut [RiderState], event: RiderEvent) -> Vec<RiderId> {
    let mut recipients = Vec::new();
    for rider in riders.iter_mut().filter(|r| !r.is_finished()) {
        if observes(rider.locus(), &event) {
            rider.events_mut().push_back(event);
            recipients.push(rider.id());
        }
    }
    recipients
}

/// Create a connected notifier and receiver.
pub(crate) fn channel() -> (Notifier, Notifications) {
    let (sender, receiver) = mpsc::unbounded();
    (Notifier { sender }, Notifications { receiver })
}

/// Engine side of an actor's notification channel.
#[derive(Debug)]
pub(crate) struct Notifier {
    sender: UnboundedSender<()>,
}

impl Notifier {
    /// Wake the actor. A dropped receiver means the actor is gone and the
    /// signal is discarded.
    pub(crate) fn signal(&self) {
        if self.sender.unbounded_send(()).is_err() {
            tracing::trace!("notification dropped, actor gone");
        }
    }
}

/// Actor side of the notification channel.
#[derive(Debug)]
pub struct Notifications {
    receiver: UnboundedReceiver<()>,
}

impl Notifications {
    /// Wait for the next signal. Returns false once the engine is gone.
    pub(crate) async fn wait(&mut self) -> bool {
        self.receiver.next().await.is_some()
    }
}

/// The controller's event queue.
#[derive(Debug)]
pub(crate) struct ControllerMailbox {
    events: VecDeque<ControllerEvent>,
    finished: bool,
    notifier: Option<Notifier>,
}

impl ControllerMailbox {
    pub(crate) fn new() -> Self {
        Self { events: VecDeque::new(), finished: false, notifier: None }
    }

    /// Attach a fresh channel, replacing any earlier one.
    pub(crate) fn connect(&mut self) -> Notifications {
        let (notifier, notifications) = channel();
        self.notifier = Some(notifier);
        notifications
    }

    pub(crate) fn push(&mut self, event: ControllerEvent) {
        self.events.push_back(event);
    }

    pub(crate) fn pop(&mut self) -> Option<ControllerEvent> {
        self.events.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.events.len()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn finish(&mut self) {
        self.finished = true;
        self.events.clear();
    }

    /// Signal the controller if it has something to do.
    pub(crate) fn notify(&self) -> bool {
        if self.finished || self.events.is_empty() {
            return false;
        }
        if let Some(notifier) = &self.notifier {
            notifier.signal();
        }
        true
    }
}
