use crate::{ComponentKind, Value};

/// Structures that implement the WorldRefType trait will be able to be read
/// by the replication core: the authoritative store on the server, and the
/// local mirror on a subscriber.
pub trait WorldRefType<E> {
    // Entities
    /// check whether entity exists
    fn has_entity(&self, entity: &E) -> bool;
    /// get a list of all entities in the World
    fn entities(&self) -> Vec<E>;

    // Components
    /// gets a Component value by kind
    fn component(&self, entity: &E, component_kind: &ComponentKind) -> Option<&Value>;
    /// check whether entity contains component of a given kind
    fn has_component(&self, entity: &E, component_kind: &ComponentKind) -> bool {
        self.component(entity, component_kind).is_some()
    }
    /// get all entities carrying a Component of a given kind
    fn entities_with(&self, component_kind: &ComponentKind) -> Vec<E> {
        self.entities()
            .into_iter()
            .filter(|entity| self.has_component(entity, component_kind))
            .collect()
    }
}

/// Structures that implement the WorldMutType trait will be able to be
/// mutated by the replication core
pub trait WorldMutType<E>: WorldRefType<E> {
    // Entities
    /// spawn an entity
    fn spawn_entity(&mut self) -> E;
    /// despawn an entity, dropping all of its Components
    fn despawn_entity(&mut self, entity: &E);

    // Components
    /// insert or overwrite a Component, returning the previous value
    fn insert_component(
        &mut self,
        entity: &E,
        component_kind: ComponentKind,
        value: Value,
    ) -> Option<Value>;
    /// remove a Component from an Entity, returning it
    fn remove_component(&mut self, entity: &E, component_kind: &ComponentKind) -> Option<Value>;
}
