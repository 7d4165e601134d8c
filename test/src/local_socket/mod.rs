/// In-memory transport for E2E testing
/// Routes encoded payloads from the Server to each Subscriber without
/// network I/O

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use replica_shared::{PayloadReceiver, PayloadSender, SubscriberKey, TransportError};

type Queue = Arc<Mutex<VecDeque<Vec<u8>>>>;

/// Server-side end: one queue per registered Subscriber
#[derive(Default)]
pub struct LocalTransport {
    queues: HashMap<SubscriberKey, Queue>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a Subscriber and returns its receiving end
    pub fn receiver(&mut self, subscriber: SubscriberKey) -> LocalReceiver {
        let queue = self.queues.entry(subscriber).or_default().clone();
        LocalReceiver { queue }
    }

    /// Number of payloads waiting for a Subscriber
    pub fn pending(&self, subscriber: &SubscriberKey) -> usize {
        self.queues
            .get(subscriber)
            .and_then(|queue| queue.lock().ok().map(|queue| queue.len()))
            .unwrap_or(0)
    }
}

impl PayloadSender for LocalTransport {
    fn send(&mut self, subscriber: &SubscriberKey, payload: &[u8]) -> Result<(), TransportError> {
        let Some(queue) = self.queues.get(subscriber) else {
            return Err(TransportError::Unreachable {
                subscriber: subscriber.to_u64(),
            });
        };
        let mut queue = queue.lock().map_err(|_| TransportError::Closed)?;
        queue.push_back(payload.to_vec());
        Ok(())
    }
}

/// Subscriber-side end
#[derive(Clone)]
pub struct LocalReceiver {
    queue: Queue,
}

impl LocalReceiver {
    /// Pushes raw bytes as if they had arrived from the Server
    pub fn inject(&self, payload: Vec<u8>) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(payload);
        }
    }
}

impl PayloadReceiver for LocalReceiver {
    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut queue = self.queue.lock().map_err(|_| TransportError::Closed)?;
        Ok(queue.pop_front())
    }
}
