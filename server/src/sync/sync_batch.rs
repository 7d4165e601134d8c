use std::collections::HashMap;

use log::trace;

use replica_shared::{
    ComponentEntry, ComponentKind, GlobalEntity, Patch, SubscriberKey, SyncMessage, Tick, Value,
};

/// Per-tick accumulator: the payload being built for each Subscriber.
///
/// Owned by the Server between two flushes, so catch-up `init`s queued on
/// connect land in the same payloads as that tick's drained changes.
pub struct SyncBatch {
    tick: Tick,
    payloads: HashMap<SubscriberKey, SyncMessage>,
}

impl SyncBatch {
    pub fn new(tick: Tick) -> Self {
        Self {
            tick,
            payloads: HashMap::new(),
        }
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn payload(&self, subscriber: &SubscriberKey) -> Option<&SyncMessage> {
        self.payloads.get(subscriber)
    }

    /// Queues a full value, replacing anything queued for the pair
    pub fn queue_init(
        &mut self,
        subscriber: SubscriberKey,
        entity: GlobalEntity,
        component_kind: ComponentKind,
        value: Value,
    ) {
        let message = self.payloads.entry(subscriber).or_default();
        if !message.insert_component(entity, component_kind, ComponentEntry::Init(value)) {
            trace!(
                "SyncBatch: {} already removed for {:?}, init dropped",
                entity,
                subscriber
            );
        }
    }

    /// Queues a patch. If something is already queued for the pair this
    /// tick, the patch cannot be layered on top of it, so the pair is sent
    /// as a full `init` of `new_value` instead.
    pub fn queue_patch(
        &mut self,
        subscriber: SubscriberKey,
        entity: GlobalEntity,
        component_kind: ComponentKind,
        patch: &Patch,
        new_value: &Value,
    ) {
        let message = self.payloads.entry(subscriber).or_default();
        if let Some(entry) = message.component_mut(&entity, &component_kind) {
            *entry = ComponentEntry::Init(new_value.clone());
            return;
        }
        message.insert_component(entity, component_kind, ComponentEntry::Patch(patch.clone()));
    }

    pub fn queue_component_removed(
        &mut self,
        subscriber: SubscriberKey,
        entity: GlobalEntity,
        component_kind: ComponentKind,
    ) {
        self.payloads
            .entry(subscriber)
            .or_default()
            .insert_component(entity, component_kind, ComponentEntry::Removed);
    }

    /// Queues an entity-level removal, discarding every component entry
    /// queued for the entity this tick
    pub fn queue_entity_removed(&mut self, subscriber: SubscriberKey, entity: GlobalEntity) {
        self.payloads
            .entry(subscriber)
            .or_default()
            .remove_entity(entity);
    }

    /// Forgets everything queued for a Subscriber
    pub fn drop_subscriber(&mut self, subscriber: &SubscriberKey) {
        self.payloads.remove(subscriber);
    }

    /// Closes the batch: one non-empty payload per connected Subscriber, in
    /// key order
    pub fn flush(self, connected: &[SubscriberKey]) -> Vec<(SubscriberKey, SyncMessage)> {
        let mut output: Vec<(SubscriberKey, SyncMessage)> = self
            .payloads
            .into_iter()
            .filter(|(subscriber, message)| !message.is_empty() && connected.contains(subscriber))
            .collect();
        output.sort_by_key(|(subscriber, _)| *subscriber);
        output
    }
}
