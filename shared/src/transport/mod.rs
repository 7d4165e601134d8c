//! Boundary to the transport layer. Delivery is assumed reliable, ordered and
//! at most once per tick per subscriber; implementations live outside the
//! replication core.

pub mod error;
pub use error::TransportError;

use crate::SubscriberKey;

/// Authoritative side: hands an encoded payload to a subscriber
pub trait PayloadSender {
    /// Sends an encoded SyncMessage to the given Subscriber
    fn send(&mut self, subscriber: &SubscriberKey, payload: &[u8]) -> Result<(), TransportError>;
}

/// Subscriber side: yields encoded payloads in arrival order
pub trait PayloadReceiver {
    /// Receives the next encoded SyncMessage, if one has arrived
    fn receive(&mut self) -> Result<Option<Vec<u8>>, TransportError>;
}
