mod sync_events;
pub use sync_events::{SyncEvent, SyncEvents};
