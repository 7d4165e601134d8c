pub mod error;
pub mod sync_message;
pub mod wire;
