pub mod entity_liveness;
pub mod local_entity_map;
