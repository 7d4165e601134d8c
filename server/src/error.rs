use thiserror::Error;

use replica_shared::{ComponentKind, MessageError, ProtocolError, SubscriberKey, TransportError};

/// Errors that can occur on the authoritative side
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServerError {
    /// Replication registry cannot be built; raised at startup, before any
    /// Subscriber can connect
    #[error("Replication misconfigured for component `{component}`: {reason}")]
    Misconfiguration {
        component: String,
        reason: &'static str,
    },

    /// Protocol registration failed
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Component kind has no replication policy registered
    #[error("{component_kind} is not registered for replication")]
    UnknownComponent { component_kind: ComponentKind },

    /// Operation requires a connected Subscriber
    #[error("Subscriber {subscriber:?} is not connected")]
    SubscriberNotConnected { subscriber: SubscriberKey },

    /// Payload for a Subscriber could not be encoded
    #[error("Failed to encode payload for subscriber {subscriber:?}: {source}")]
    Encode {
        subscriber: SubscriberKey,
        source: MessageError,
    },

    /// Payload could not be handed to the transport
    #[error("Failed to send payload to subscriber {subscriber:?}: {source}")]
    Transport {
        subscriber: SubscriberKey,
        source: TransportError,
    },
}
