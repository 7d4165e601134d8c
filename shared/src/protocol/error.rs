use thiserror::Error;

/// Errors that can occur during protocol operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified. Protocol.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// A Component with the same name was already registered
    #[error("Component `{name}` is already registered with the Protocol")]
    DuplicateComponent { name: String },

    /// Component name was never registered
    #[error("Component `{name}` is not registered with the Protocol. Must call `add_component()` during protocol initialization")]
    UnknownComponent { name: String },
}
