use std::fmt;

use serde::{Deserialize, Serialize};

use crate::EntityKey;

// GlobalEntity
/// Authoritative entity identifier, as it appears on the wire.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlobalEntity(u64);

impl EntityKey for GlobalEntity {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        GlobalEntity(value)
    }
}

impl GlobalEntity {
    pub fn from_entity<E: EntityKey>(entity: &E) -> Self {
        Self(entity.to_u64())
    }
}

impl fmt::Display for GlobalEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GlobalEntity({})", self.0)
    }
}
