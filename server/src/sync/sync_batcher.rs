use std::collections::HashMap;

use log::trace;

use replica_shared::{diff, strip_fields, ComponentKind, EntityKey, GlobalEntity};

use crate::{ComponentChange, ReplicationRegistry, ServerError, SyncBatch, VisibilityResolver};

/// Turns drained ChangeFeed records into per-Subscriber payload entries
#[derive(Clone, Copy, Debug)]
pub struct SyncBatcher {
    skip_empty_patches: bool,
}

impl SyncBatcher {
    pub fn new(skip_empty_patches: bool) -> Self {
        Self { skip_empty_patches }
    }

    /// Queues the drained records of one component kind into `batch`,
    /// updating visibility as pairs appear and disappear
    pub fn process<E: EntityKey>(
        &self,
        batch: &mut SyncBatch,
        registry: &ReplicationRegistry,
        visibility: &mut VisibilityResolver<E>,
        component_kind: ComponentKind,
        records: Vec<ComponentChange<E>>,
    ) -> Result<(), ServerError> {
        let policy = registry.try_policy(&component_kind)?;
        let excluded = policy.unreplicated_fields();

        for record in merge_change_runs(records) {
            match record {
                ComponentChange::Added { entity, new } => {
                    let global_entity = GlobalEntity::from_entity(&entity);
                    let subscribers = visibility.attach(entity, component_kind, &new, policy);
                    if subscribers.is_empty() {
                        continue;
                    }
                    let init = strip_fields(&new, excluded);
                    for subscriber in subscribers {
                        batch.queue_init(subscriber, global_entity, component_kind, init.clone());
                    }
                }
                ComponentChange::Changed { entity, old, new } => {
                    let subscribers = visibility.visible_subscribers(&entity, &component_kind);
                    if subscribers.is_empty() {
                        continue;
                    }
                    let patch = diff(&old, &new, excluded);
                    if patch.is_empty() && self.skip_empty_patches {
                        trace!("SyncBatcher: empty patch for {} skipped", component_kind);
                        continue;
                    }
                    let global_entity = GlobalEntity::from_entity(&entity);
                    let init = strip_fields(&new, excluded);
                    for subscriber in subscribers {
                        batch.queue_patch(subscriber, global_entity, component_kind, &patch, &init);
                    }
                }
                ComponentChange::Removed {
                    entity,
                    destroyed_entity: true,
                    ..
                } => {
                    let global_entity = GlobalEntity::from_entity(&entity);
                    for subscriber in visibility.connected_subscribers() {
                        batch.queue_entity_removed(subscriber, global_entity);
                    }
                    visibility.clear_entity(&entity);
                }
                ComponentChange::Removed { entity, .. } => {
                    let global_entity = GlobalEntity::from_entity(&entity);
                    for subscriber in visibility.clear_component(&entity, &component_kind) {
                        batch.queue_component_removed(subscriber, global_entity, component_kind);
                    }
                }
            }
        }

        Ok(())
    }
}

/// Collapses successive `Changed` records of one pair into a single record
/// spanning from the first `old` to the last `new`, so each Subscriber gets
/// one patch per pair per tick.
pub(crate) fn merge_change_runs<E: EntityKey>(records: Vec<ComponentChange<E>>) -> Vec<ComponentChange<E>> {
    let mut output: Vec<ComponentChange<E>> = Vec::with_capacity(records.len());
    let mut open_runs: HashMap<E, usize> = HashMap::new();

    for record in records {
        match record {
            ComponentChange::Changed { entity, old, new } => {
                if let Some(index) = open_runs.get(&entity) {
                    if let ComponentChange::Changed { new: run_new, .. } = &mut output[*index] {
                        *run_new = new;
                        continue;
                    }
                }
                open_runs.insert(entity, output.len());
                output.push(ComponentChange::Changed { entity, old, new });
            }
            other => {
                open_runs.remove(other.entity());
                output.push(other);
            }
        }
    }

    output
}
