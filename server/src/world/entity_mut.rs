use replica_shared::{ComponentKind, EntityKey, Value, WorldMutType};

use crate::{Server, ServerError};

// EntityMut
/// Writes to one Entity of the store, recording each mutation for
/// replication as it is applied
pub struct EntityMut<'s, E: EntityKey, W: WorldMutType<E>> {
    server: &'s mut Server<E>,
    world: &'s mut W,
    entity: E,
}

impl<'s, E: EntityKey, W: WorldMutType<E>> EntityMut<'s, E, W> {
    pub(crate) fn new(server: &'s mut Server<E>, world: &'s mut W, entity: &E) -> Self {
        Self {
            server,
            world,
            entity: *entity,
        }
    }

    pub fn id(&self) -> E {
        self.entity
    }

    pub fn despawn(&mut self) {
        self.world.despawn_entity(&self.entity);
        self.server.despawn_entity_worldless(&self.entity);
    }

    // Components

    pub fn has_component(&self, component_kind: &ComponentKind) -> bool {
        self.world.has_component(&self.entity, component_kind)
    }

    pub fn component(&self, component_kind: &ComponentKind) -> Option<&Value> {
        self.world.component(&self.entity, component_kind)
    }

    /// Inserts or overwrites a Component. Fails, leaving the store untouched,
    /// if the kind is not registered for replication.
    pub fn insert_component(
        &mut self,
        component_kind: ComponentKind,
        value: Value,
    ) -> Result<&mut Self, ServerError> {
        self.server.registry().try_policy(&component_kind)?;
        self.world
            .insert_component(&self.entity, component_kind, value.clone());
        self.server
            .insert_component_worldless(&self.entity, component_kind, value)?;

        Ok(self)
    }

    pub fn remove_component(&mut self, component_kind: &ComponentKind) -> Option<Value> {
        let removed = self.world.remove_component(&self.entity, component_kind);
        if removed.is_some() {
            self.server
                .remove_component_worldless(&self.entity, component_kind);
        }
        removed
    }
}
