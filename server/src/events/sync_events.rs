use std::vec::IntoIter;

use replica_shared::{SubscriberKey, SyncMessage, Tick};

/// A payload ready to be transmitted to one Subscriber
#[derive(Clone, Debug, PartialEq)]
pub struct SyncEvent {
    pub subscriber: SubscriberKey,
    pub tick: Tick,
    pub message: SyncMessage,
}

pub struct SyncEvents {
    payloads: Vec<SyncEvent>,
    empty: bool,
}

impl SyncEvents {
    pub(crate) fn new() -> Self {
        Self {
            payloads: Vec::new(),
            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Payload queued for the given Subscriber, if any
    pub fn payload(&self, subscriber: &SubscriberKey) -> Option<&SyncMessage> {
        self.payloads
            .iter()
            .find(|event| event.subscriber == *subscriber)
            .map(|event| &event.message)
    }

    pub fn read(&mut self) -> IntoIter<SyncEvent> {
        let list = std::mem::take(&mut self.payloads);
        self.empty = true;
        IntoIterator::into_iter(list)
    }

    // Crate-public

    pub(crate) fn push_payload(&mut self, subscriber: SubscriberKey, tick: Tick, message: SyncMessage) {
        self.payloads.push(SyncEvent {
            subscriber,
            tick,
            message,
        });
        self.empty = false;
    }
}
