use replica_shared::{ComponentKind, EntityKey, SubscriberKey, Value, WorldRefType};

use crate::Server;

// EntityRef
pub struct EntityRef<'s, E: EntityKey, W: WorldRefType<E>> {
    server: &'s Server<E>,
    world: &'s W,
    entity: E,
}

impl<'s, E: EntityKey, W: WorldRefType<E>> EntityRef<'s, E, W> {
    pub(crate) fn new(server: &'s Server<E>, world: &'s W, entity: &E) -> Self {
        Self {
            server,
            world,
            entity: *entity,
        }
    }

    pub fn id(&self) -> E {
        self.entity
    }

    pub fn has_component(&self, component_kind: &ComponentKind) -> bool {
        self.world.has_component(&self.entity, component_kind)
    }

    pub fn component(&self, component_kind: &ComponentKind) -> Option<&Value> {
        self.world.component(&self.entity, component_kind)
    }

    /// Subscribers the Component of this Entity is currently visible to
    pub fn visible_subscribers(&self, component_kind: &ComponentKind) -> Vec<SubscriberKey> {
        self.server.visible_subscribers(&self.entity, component_kind)
    }
}
