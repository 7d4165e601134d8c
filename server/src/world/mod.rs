pub mod change_feed;
pub mod entity_mut;
pub mod entity_ref;
pub mod replication_policy;
pub mod replication_registry;
pub mod visibility;
