use thiserror::Error;

use replica_shared::{ComponentKind, GlobalEntity, MessageError, PatchError, TransportError};

/// Errors that can occur while reconciling the local mirror. Each one
/// affects a single update, which is logged and dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Payload bytes are not a well-formed SyncMessage
    #[error("Payload rejected: {0}")]
    Validation(#[from] MessageError),

    /// Patch could not be applied onto the local value
    #[error("Patch for {component_kind} on {entity} dropped: {reason}")]
    Desync {
        entity: GlobalEntity,
        component_kind: ComponentKind,
        reason: DesyncReason,
    },

    /// Entry names a Component the Protocol does not know
    #[error("Entry for unregistered {component_kind} on {entity} dropped")]
    UnknownComponent {
        entity: GlobalEntity,
        component_kind: ComponentKind,
    },

    /// Payloads could not be read from the transport
    #[error("Transport failure: {0}")]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DesyncReason {
    /// No local value exists for the pair
    #[error("no local value to patch")]
    MissingBase,

    /// Local value does not have the shape the patch expects
    #[error(transparent)]
    Incompatible(#[from] PatchError),
}
