use std::default::Default;

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Drop an `Added .. Removed` run of one (entity, component) pair that
    /// starts and ends within a single tick, so Subscribers never see a
    /// transient `init` followed by its removal.
    pub coalesce_transient_components: bool,
    /// Do not queue patches that carry no change (e.g. only unreplicated
    /// fields were written)
    pub skip_empty_patches: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            coalesce_transient_components: false,
            skip_empty_patches: true,
        }
    }
}
