//! # Replica Client
//! Applies incremental replication payloads to a local mirror of the
//! authoritative Entities/Components, translating Entity ids on the way.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replica_shared::{
        decode_message, ComponentEntry, ComponentKind, EntityEntry, EntityKey, GlobalEntity,
        PayloadReceiver, Protocol, SyncMessage, Value,
    };
}

mod client;
mod client_config;
mod error;
mod events;
mod world;

pub use client::Client;
pub use client_config::ClientConfig;
pub use error::{ClientError, DesyncReason};
pub use events::{ClientEvent, ClientEvents};
pub use world::{entity_liveness::EntityLiveness, local_entity_map::LocalEntityMap};
