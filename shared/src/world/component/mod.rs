pub mod component_kinds;
pub mod entity_refs;
pub mod error;
pub mod patch;
pub mod value;
