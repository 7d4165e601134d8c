use std::collections::HashMap;

use replica_shared::{EntityKey, GlobalEntity};

/// Bidirectional authoritative id <-> local Entity map, populated lazily
pub struct LocalEntityMap<E: EntityKey> {
    global_to_local: HashMap<GlobalEntity, E>,
    local_to_global: HashMap<E, GlobalEntity>,
}

impl<E: EntityKey> Default for LocalEntityMap<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKey> LocalEntityMap<E> {
    pub fn new() -> Self {
        Self {
            global_to_local: HashMap::new(),
            local_to_global: HashMap::new(),
        }
    }

    /// Binds the pair, dropping any earlier binding of either side. Returns
    /// the local Entity previously bound to `global_entity`.
    pub fn insert(&mut self, global_entity: GlobalEntity, local_entity: E) -> Option<E> {
        if let Some(old_global_entity) = self.local_to_global.remove(&local_entity) {
            self.global_to_local.remove(&old_global_entity);
        }
        let old_local_entity = self.global_to_local.insert(global_entity, local_entity);
        if let Some(old_local_entity) = old_local_entity {
            self.local_to_global.remove(&old_local_entity);
        }
        self.local_to_global.insert(local_entity, global_entity);
        old_local_entity
    }

    pub fn local_entity(&self, global_entity: &GlobalEntity) -> Option<E> {
        self.global_to_local.get(global_entity).copied()
    }

    pub fn global_entity(&self, local_entity: &E) -> Option<GlobalEntity> {
        self.local_to_global.get(local_entity).copied()
    }

    pub fn contains_global(&self, global_entity: &GlobalEntity) -> bool {
        self.global_to_local.contains_key(global_entity)
    }

    pub fn remove_by_global(&mut self, global_entity: &GlobalEntity) -> Option<E> {
        let local_entity = self.global_to_local.remove(global_entity)?;
        self.local_to_global.remove(&local_entity);
        Some(local_entity)
    }

    pub fn remove_by_local(&mut self, local_entity: &E) -> Option<GlobalEntity> {
        let global_entity = self.local_to_global.remove(local_entity)?;
        self.global_to_local.remove(&global_entity);
        Some(global_entity)
    }

    /// All bindings, ordered by authoritative id
    pub fn entries(&self) -> Vec<(GlobalEntity, E)> {
        let mut entries: Vec<(GlobalEntity, E)> = self
            .global_to_local
            .iter()
            .map(|(global_entity, local_entity)| (*global_entity, *local_entity))
            .collect();
        entries.sort_by_key(|(global_entity, _)| *global_entity);
        entries
    }

    pub fn len(&self) -> usize {
        self.global_to_local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global_to_local.is_empty()
    }
}
