use std::default::Default;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// During garbage collection, forget id mappings whose local Entity was
    /// despawned by the application
    pub prune_despawned_entities: bool,
    /// Surface dropped patches as `ClientEvent::Desync`, in addition to
    /// logging them
    pub record_desync_events: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            prune_despawned_entities: true,
            record_desync_events: true,
        }
    }
}
