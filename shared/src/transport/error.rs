use thiserror::Error;

/// Errors surfaced by a transport implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// No route to the given Subscriber
    #[error("Subscriber {subscriber} is not reachable")]
    Unreachable { subscriber: u64 },

    /// Underlying channel has been closed
    #[error("Transport channel is closed")]
    Closed,
}
