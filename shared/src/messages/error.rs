use thiserror::Error;

/// Errors that can occur while moving a SyncMessage on or off the wire
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// SyncMessage could not be serialized
    #[error("Failed to encode SyncMessage: {reason}")]
    Encode { reason: String },

    /// Incoming bytes are not a well-formed SyncMessage
    #[error("Malformed SyncMessage payload ({len} bytes): {reason}")]
    Malformed { len: usize, reason: String },
}
