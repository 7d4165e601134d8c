//! # Replica Shared
//! Common functionality shared between replica-server & replica-client crates.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod messages;
mod protocol;
mod transport;
mod types;
mod world;

pub use messages::{
    error::MessageError,
    sync_message::{ComponentEntry, EntityEntry, PayloadType, SyncMessage},
    wire::{decode_message, encode_message},
};
pub use protocol::{Protocol, ProtocolError};
pub use transport::{PayloadReceiver, PayloadSender, TransportError};
pub use types::{SubscriberKey, Tick};
pub use world::{
    component::{
        component_kinds::{ComponentKind, ComponentKinds},
        entity_refs::{for_each_entity_in_patch_mut, for_each_entity_mut},
        error::PatchError,
        patch::{apply, diff, strip_fields, MapPatch, Patch, SeqPatch},
        value::Value,
    },
    entity::{entity_key::EntityKey, global_entity::GlobalEntity},
    world_type::{WorldMutType, WorldRefType},
};
