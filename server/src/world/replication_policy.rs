use std::{collections::BTreeSet, fmt, sync::Arc};

use replica_shared::{GlobalEntity, SubscriberKey, Value};

/// Custom admission check: may `subscriber` see this entity's component value?
pub type Predicate = Arc<dyn Fn(&SubscriberKey, &GlobalEntity, &Value) -> bool + Send + Sync>;

/// When visibility of a Component is evaluated
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplicationMode {
    /// Evaluated against every connected Subscriber when the Component is
    /// first observed; later Subscribers are admitted through catch-up
    #[default]
    AllAtOnce,
    /// Evaluated lazily, one Subscriber at a time, on explicit connect events
    PerSubscriberConnection,
}

/// Static replication settings of one Component type
#[derive(Clone, Default)]
pub struct ReplicationPolicy {
    mode: ReplicationMode,
    predicate: Option<Predicate>,
    unreplicated_fields: BTreeSet<String>,
}

impl ReplicationPolicy {
    pub fn new(mode: ReplicationMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn all_at_once() -> Self {
        Self::new(ReplicationMode::AllAtOnce)
    }

    pub fn per_subscriber_connection() -> Self {
        Self::new(ReplicationMode::PerSubscriberConnection)
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SubscriberKey, &GlobalEntity, &Value) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Marks a top-level field as never replicated
    pub fn unreplicated_field(mut self, field: &str) -> Self {
        self.unreplicated_fields.insert(field.to_string());
        self
    }

    pub fn mode(&self) -> ReplicationMode {
        self.mode
    }

    pub fn unreplicated_fields(&self) -> &BTreeSet<String> {
        &self.unreplicated_fields
    }

    /// A Component without a predicate is visible to every Subscriber
    pub fn admits(&self, subscriber: &SubscriberKey, entity: &GlobalEntity, value: &Value) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(subscriber, entity, value),
            None => true,
        }
    }
}

impl fmt::Debug for ReplicationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicationPolicy")
            .field("mode", &self.mode)
            .field("has_predicate", &self.predicate.is_some())
            .field("unreplicated_fields", &self.unreplicated_fields)
            .finish()
    }
}
