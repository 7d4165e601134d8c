pub mod entity_key;
pub mod global_entity;
