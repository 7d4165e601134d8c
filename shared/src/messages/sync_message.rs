use std::collections::{btree_map, BTreeMap};

use serde::{Deserialize, Serialize};

use crate::{ComponentKind, GlobalEntity, Patch, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadType {
    Init,
    Patch,
}

/// Per-component entry of a SyncMessage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ComponentEntry {
    Removed,
    /// Full value, becomes the receiver's new base
    Init(Value),
    /// Delta against the receiver's current base
    Patch(Patch),
}

impl ComponentEntry {
    pub fn payload_type(&self) -> Option<PayloadType> {
        match self {
            ComponentEntry::Removed => None,
            ComponentEntry::Init(_) => Some(PayloadType::Init),
            ComponentEntry::Patch(_) => Some(PayloadType::Patch),
        }
    }
}

/// Per-entity entry of a SyncMessage
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EntityEntry {
    Removed,
    Components(BTreeMap<ComponentKind, ComponentEntry>),
}

impl EntityEntry {
    pub fn is_removed(&self) -> bool {
        matches!(self, EntityEntry::Removed)
    }

    pub fn component(&self, component_kind: &ComponentKind) -> Option<&ComponentEntry> {
        match self {
            EntityEntry::Removed => None,
            EntityEntry::Components(components) => components.get(component_kind),
        }
    }
}

/// Everything one subscriber needs to learn in one tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncMessage {
    entities: BTreeMap<GlobalEntity, EntityEntry>,
}

impl SyncMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn entity(&self, entity: &GlobalEntity) -> Option<&EntityEntry> {
        self.entities.get(entity)
    }

    pub fn component(
        &self,
        entity: &GlobalEntity,
        component_kind: &ComponentKind,
    ) -> Option<&ComponentEntry> {
        self.entities
            .get(entity)
            .and_then(|entry| entry.component(component_kind))
    }

    pub fn iter(&self) -> btree_map::Iter<'_, GlobalEntity, EntityEntry> {
        self.entities.iter()
    }

    /// Queues a component entry, replacing any earlier entry for the same
    /// pair. Returns false without queueing if the entity has already been
    /// marked removed in this message.
    pub fn insert_component(
        &mut self,
        entity: GlobalEntity,
        component_kind: ComponentKind,
        entry: ComponentEntry,
    ) -> bool {
        let entity_entry = self
            .entities
            .entry(entity)
            .or_insert_with(|| EntityEntry::Components(BTreeMap::new()));
        match entity_entry {
            EntityEntry::Removed => false,
            EntityEntry::Components(components) => {
                components.insert(component_kind, entry);
                true
            }
        }
    }

    pub fn component_mut(
        &mut self,
        entity: &GlobalEntity,
        component_kind: &ComponentKind,
    ) -> Option<&mut ComponentEntry> {
        match self.entities.get_mut(entity) {
            Some(EntityEntry::Components(components)) => components.get_mut(component_kind),
            _ => None,
        }
    }

    /// Marks the entity removed, discarding any component entries for it
    pub fn remove_entity(&mut self, entity: GlobalEntity) {
        self.entities.insert(entity, EntityEntry::Removed);
    }
}

impl IntoIterator for SyncMessage {
    type Item = (GlobalEntity, EntityEntry);
    type IntoIter = btree_map::IntoIter<GlobalEntity, EntityEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entities.into_iter()
    }
}

impl FromIterator<(GlobalEntity, EntityEntry)> for SyncMessage {
    fn from_iter<I: IntoIterator<Item = (GlobalEntity, EntityEntry)>>(iter: I) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}
