//! # Replica Server
//! Tracks replicable Entities/Components of an authoritative store, resolves
//! which subscribers may see each (entity, component) pair, and builds one
//! incremental payload per subscriber per tick.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use replica_shared::{
        decode_message, encode_message, ComponentEntry, ComponentKind, EntityEntry, EntityKey,
        GlobalEntity, PayloadSender, Protocol, SubscriberKey, SyncMessage, Tick, Value,
    };
}

mod error;
mod events;
mod server;
mod sync;
mod world;

pub use error::ServerError;
pub use events::{SyncEvent, SyncEvents};
pub use server::{Server, ServerConfig};
pub use sync::{sync_batch::SyncBatch, sync_batcher::SyncBatcher};
pub use world::{
    change_feed::{ChangeFeed, ComponentChange},
    entity_mut::EntityMut,
    entity_ref::EntityRef,
    replication_policy::{Predicate, ReplicationMode, ReplicationPolicy},
    replication_registry::{ReplicationRegistry, ReplicationRegistryBuilder},
    visibility::VisibilityResolver,
};
