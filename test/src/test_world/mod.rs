/// Simple World implementation for E2E testing, used both as the
/// authoritative store and as a Subscriber's local mirror

use std::collections::HashMap;

use replica_shared::{ComponentKind, EntityKey, Value, WorldMutType, WorldRefType};

// TestEntity - Simple u64-based entity
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct TestEntity(u64);

impl EntityKey for TestEntity {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        TestEntity(value)
    }
}

impl TestEntity {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

// TestWorld - Simple HashMap-based world
pub struct TestWorld {
    pub entities: HashMap<TestEntity, HashMap<ComponentKind, Value>>,
    next_id: u64,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// A World whose Entity ids start at `first_id`, so that two Worlds in
    /// one test never hand out the same ids
    pub fn starting_at(first_id: u64) -> Self {
        Self {
            entities: HashMap::new(),
            next_id: first_id,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

// WorldRefType implementation
impl WorldRefType<TestEntity> for TestWorld {
    fn has_entity(&self, entity: &TestEntity) -> bool {
        self.entities.contains_key(entity)
    }

    fn entities(&self) -> Vec<TestEntity> {
        let mut entities: Vec<TestEntity> = self.entities.keys().copied().collect();
        entities.sort();
        entities
    }

    fn component(&self, entity: &TestEntity, component_kind: &ComponentKind) -> Option<&Value> {
        self.entities
            .get(entity)
            .and_then(|component_map| component_map.get(component_kind))
    }
}

// WorldMutType implementation
impl WorldMutType<TestEntity> for TestWorld {
    fn spawn_entity(&mut self) -> TestEntity {
        let entity = TestEntity(self.next_id);
        self.next_id += 1;
        self.entities.insert(entity, HashMap::new());
        entity
    }

    fn despawn_entity(&mut self, entity: &TestEntity) {
        self.entities.remove(entity);
    }

    fn insert_component(
        &mut self,
        entity: &TestEntity,
        component_kind: ComponentKind,
        value: Value,
    ) -> Option<Value> {
        self.entities
            .get_mut(entity)
            .and_then(|component_map| component_map.insert(component_kind, value))
    }

    fn remove_component(
        &mut self,
        entity: &TestEntity,
        component_kind: &ComponentKind,
    ) -> Option<Value> {
        self.entities
            .get_mut(entity)
            .and_then(|component_map| component_map.remove(component_kind))
    }
}
