use std::collections::{HashMap, VecDeque};

use log::warn;

use replica_shared::{ComponentKind, EntityKey, Value, WorldRefType};

/// One mutation observed in the authoritative store
#[derive(Clone, Debug, PartialEq)]
pub enum ComponentChange<E> {
    Added {
        entity: E,
        new: Value,
    },
    Changed {
        entity: E,
        old: Value,
        new: Value,
    },
    Removed {
        entity: E,
        old: Value,
        /// true when the whole entity was destroyed, false when only this
        /// component was removed
        destroyed_entity: bool,
    },
}

impl<E> ComponentChange<E> {
    pub fn entity(&self) -> &E {
        match self {
            ComponentChange::Added { entity, .. }
            | ComponentChange::Changed { entity, .. }
            | ComponentChange::Removed { entity, .. } => entity,
        }
    }
}

/// Per-component-type FIFO of mutations since the last drain.
///
/// Keeps the last observed value of every (entity, component) pair, which
/// decides whether a write is an add or a change and supplies the `old`
/// value of changes and removals.
pub struct ChangeFeed<E: EntityKey> {
    queues: HashMap<ComponentKind, VecDeque<ComponentChange<E>>>,
    kinds: Vec<ComponentKind>,
    observed: HashMap<(E, ComponentKind), Value>,
    coalesce_transient: bool,
}

impl<E: EntityKey> ChangeFeed<E> {
    pub fn new(coalesce_transient: bool) -> Self {
        Self {
            queues: HashMap::new(),
            kinds: Vec::new(),
            observed: HashMap::new(),
            coalesce_transient,
        }
    }

    pub fn subscribe(&mut self, component_kind: ComponentKind) {
        if self.queues.contains_key(&component_kind) {
            return;
        }
        self.queues.insert(component_kind, VecDeque::new());
        self.kinds.push(component_kind);
    }

    pub fn is_subscribed(&self, component_kind: &ComponentKind) -> bool {
        self.queues.contains_key(component_kind)
    }

    /// Subscribed kinds, in subscription order
    pub fn kinds(&self) -> &[ComponentKind] {
        &self.kinds
    }

    pub fn observed(&self, entity: &E, component_kind: &ComponentKind) -> Option<&Value> {
        self.observed.get(&(*entity, *component_kind))
    }

    /// Kinds of the entity with an observed value, in kind order
    pub fn observed_kinds(&self, entity: &E) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = self
            .observed
            .keys()
            .filter(|(observed_entity, _)| observed_entity == entity)
            .map(|(_, component_kind)| *component_kind)
            .collect();
        kinds.sort();
        kinds
    }

    /// Records that `value` was written to the pair. Returns false if nothing
    /// was queued (unsubscribed kind, or value equal to the last observed one).
    pub fn record_insert(&mut self, entity: E, component_kind: ComponentKind, value: Value) -> bool {
        let Some(queue) = self.queues.get_mut(&component_kind) else {
            warn!("ChangeFeed: {} has no subscription, ignoring write", component_kind);
            return false;
        };

        let change = match self.observed.get(&(entity, component_kind)) {
            Some(old) if *old == value => return false,
            Some(old) => ComponentChange::Changed {
                entity,
                old: old.clone(),
                new: value.clone(),
            },
            None => ComponentChange::Added {
                entity,
                new: value.clone(),
            },
        };
        queue.push_back(change);
        self.observed.insert((entity, component_kind), value);
        true
    }

    /// Records that the pair was removed. Returns false if the pair was never
    /// observed.
    pub fn record_remove(
        &mut self,
        entity: E,
        component_kind: ComponentKind,
        destroyed_entity: bool,
    ) -> bool {
        let Some(old) = self.observed.remove(&(entity, component_kind)) else {
            return false;
        };
        if let Some(queue) = self.queues.get_mut(&component_kind) {
            queue.push_back(ComponentChange::Removed {
                entity,
                old,
                destroyed_entity,
            });
        }
        true
    }

    /// Records destruction of an entity: one removal per observed component
    pub fn record_despawn(&mut self, entity: E) {
        for component_kind in self.kinds.clone() {
            self.record_remove(entity, component_kind, true);
        }
    }

    /// Compares the store against the last observed values and records every
    /// difference, for stores that cannot report their own mutations.
    pub fn detect_changes<W: WorldRefType<E>>(&mut self, world: &W) {
        for component_kind in self.kinds.clone() {
            let observed_entities: Vec<E> = self
                .observed
                .keys()
                .filter(|(_, kind)| *kind == component_kind)
                .map(|(entity, _)| *entity)
                .collect();
            for entity in observed_entities {
                if !world.has_entity(&entity) {
                    self.record_remove(entity, component_kind, true);
                } else if !world.has_component(&entity, &component_kind) {
                    self.record_remove(entity, component_kind, false);
                }
            }

            for entity in world.entities_with(&component_kind) {
                if let Some(value) = world.component(&entity, &component_kind) {
                    self.record_insert(entity, component_kind, value.clone());
                }
            }
        }
    }

    /// Takes every record queued for `component_kind`, oldest first
    pub fn drain(&mut self, component_kind: &ComponentKind) -> Vec<ComponentChange<E>> {
        let Some(queue) = self.queues.get_mut(component_kind) else {
            return Vec::new();
        };
        let records: Vec<ComponentChange<E>> = queue.drain(..).collect();
        if self.coalesce_transient {
            coalesce_transient(records)
        } else {
            records
        }
    }

    /// Drains every subscribed kind, in subscription order
    pub fn drain_all(&mut self) -> Vec<(ComponentKind, Vec<ComponentChange<E>>)> {
        self.kinds
            .clone()
            .into_iter()
            .map(|component_kind| (component_kind, self.drain(&component_kind)))
            .filter(|(_, records)| !records.is_empty())
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}

/// Drops every `Added .. Removed` run of one pair that ends with the component
/// being removed individually, so subscribers never learn about it.
fn coalesce_transient<E: EntityKey>(records: Vec<ComponentChange<E>>) -> Vec<ComponentChange<E>> {
    let mut keep = vec![true; records.len()];
    let mut open_runs: HashMap<E, Vec<usize>> = HashMap::new();

    for (index, record) in records.iter().enumerate() {
        match record {
            ComponentChange::Added { entity, .. } => {
                open_runs.insert(*entity, vec![index]);
            }
            ComponentChange::Changed { entity, .. } => {
                if let Some(run) = open_runs.get_mut(entity) {
                    run.push(index);
                }
            }
            ComponentChange::Removed {
                entity,
                destroyed_entity: false,
                ..
            } => {
                if let Some(run) = open_runs.remove(entity) {
                    for run_index in run {
                        keep[run_index] = false;
                    }
                    keep[index] = false;
                }
            }
            ComponentChange::Removed { entity, .. } => {
                open_runs.remove(entity);
            }
        }
    }

    records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}
