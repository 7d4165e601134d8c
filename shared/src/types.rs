use serde::{Deserialize, Serialize};

pub type Tick = u16;

/// Identifies a consumer process receiving replicated state.
///
/// Keys are handed out by whatever owns the connection lifecycle
/// (transport/session layer); the replication core only compares them.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriberKey(u64);

impl SubscriberKey {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}
