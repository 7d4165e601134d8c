/// Client-side reconciliation: id translation, idempotence, overwrite
/// semantics and garbage collection

use std::collections::{BTreeSet, HashSet};

use replica_client::{ClientConfig, ClientError, ClientEvent};
use replica_shared::{
    diff, ComponentEntry, ComponentKinds, EntityKey, GlobalEntity, SyncMessage, Value,
    WorldMutType, WorldRefType,
};
use replica_test::{health, position, target, TestClient, TestEntity, TestKinds};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn init_message(entity: GlobalEntity, entries: Vec<(replica_shared::ComponentKind, Value)>) -> SyncMessage {
    let mut message = SyncMessage::new();
    for (component_kind, value) in entries {
        message.insert_component(entity, component_kind, ComponentEntry::Init(value));
    }
    message
}

fn removal_message(entity: GlobalEntity) -> SyncMessage {
    let mut message = SyncMessage::new();
    message.remove_entity(entity);
    message
}

#[test]
fn test_first_reference_spawns_local_entity() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(5);

    client.apply(init_message(entity, vec![(kinds.position, position(1, 2))]));

    let local_entity = client.local(&entity).expect("local entity spawned");
    assert_ne!(local_entity.to_u64(), entity.to_u64());
    assert_eq!(client.client.global_entity(&local_entity), Some(entity));
    let events: Vec<ClientEvent<TestEntity>> = client.client.take_events().read().collect();
    assert_eq!(
        events,
        vec![
            ClientEvent::Spawn(local_entity),
            ClientEvent::Insert(local_entity, kinds.position)
        ]
    );
}

#[test]
fn test_entity_removal_is_idempotent() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(5);
    client.apply(init_message(entity, vec![(kinds.position, position(1, 2))]));

    assert_eq!(client.apply(removal_message(entity)), 1);
    let entity_count = client.world.entity_count();
    let mirrored = client.client.mirrored_entities();

    assert_eq!(client.apply(removal_message(entity)), 0);
    assert_eq!(client.world.entity_count(), entity_count);
    assert_eq!(client.client.mirrored_entities(), mirrored);
    assert!(!client.has_entity(&entity));
}

#[test]
fn test_removal_of_unknown_entity_spawns_nothing() {
    init_logger();
    let mut client = TestClient::new(1);

    assert_eq!(client.apply(removal_message(GlobalEntity::from_u64(9))), 0);
    assert_eq!(client.world.entity_count(), 0);
}

#[test]
fn test_component_removal_of_absent_value_is_noop() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(5);
    client.apply(init_message(entity, vec![(kinds.position, position(1, 2))]));

    let mut message = SyncMessage::new();
    message.insert_component(entity, kinds.health, ComponentEntry::Removed);
    assert_eq!(client.apply(message.clone()), 0);

    let mut message = SyncMessage::new();
    message.insert_component(entity, kinds.position, ComponentEntry::Removed);
    assert_eq!(client.apply(message.clone()), 1);
    assert_eq!(client.apply(message), 0);
    assert!(client.has_entity(&entity));
    assert_eq!(client.value(&entity, &kinds.position), None);
}

#[test]
fn test_init_overwrites_instead_of_merging() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(5);
    client.apply(init_message(entity, vec![(kinds.position, position(1, 2))]));

    let replacement = Value::map([("x", Value::Int(7))]);
    client.apply(init_message(entity, vec![(kinds.position, replacement.clone())]));

    assert_eq!(client.value(&entity, &kinds.position), Some(&replacement));
}

#[test]
fn test_patch_applies_onto_local_value() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(5);
    client.apply(init_message(entity, vec![(kinds.health, health(10))]));
    client.client.take_events();

    let mut message = SyncMessage::new();
    message.insert_component(
        entity,
        kinds.health,
        ComponentEntry::Patch(diff(&health(10), &health(4), &BTreeSet::new())),
    );
    assert_eq!(client.apply(message), 1);

    assert_eq!(client.value(&entity, &kinds.health), Some(&health(4)));
    let local_entity = client.local(&entity).expect("mirrored");
    let events: Vec<ClientEvent<TestEntity>> = client.client.take_events().read().collect();
    assert_eq!(events, vec![ClientEvent::Update(local_entity, kinds.health)]);
}

#[test]
fn test_entity_references_are_translated() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let hunter = GlobalEntity::from_u64(1);
    let prey = GlobalEntity::from_u64(2);

    client.apply(init_message(hunter, vec![(kinds.target, target(&prey))]));

    let local_prey = client.local(&prey).expect("referenced entity spawned");
    assert_eq!(
        client.value(&hunter, &kinds.target),
        Some(&target(&local_prey))
    );

    // the entity referenced first keeps its local id once its own data arrives
    client.apply(init_message(prey, vec![(kinds.position, position(3, 3))]));
    assert_eq!(client.local(&prey), Some(local_prey));
    assert_eq!(client.value(&prey, &kinds.position), Some(&position(3, 3)));
}

#[test]
fn test_entity_references_in_patches_are_translated() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let hunter = GlobalEntity::from_u64(1);
    let first_prey = GlobalEntity::from_u64(2);
    let second_prey = GlobalEntity::from_u64(3);
    client.apply(init_message(hunter, vec![(kinds.target, target(&first_prey))]));

    let mut message = SyncMessage::new();
    message.insert_component(
        hunter,
        kinds.target,
        ComponentEntry::Patch(diff(&target(&first_prey), &target(&second_prey), &BTreeSet::new())),
    );
    client.apply(message);

    let local_second_prey = client.local(&second_prey).expect("referenced entity spawned");
    assert_eq!(
        client.value(&hunter, &kinds.target),
        Some(&target(&local_second_prey))
    );
}

#[test]
fn test_rejected_patch_spawns_no_referenced_entity() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let hunter = GlobalEntity::from_u64(5);
    client.apply(init_message(hunter, vec![(kinds.target, Value::Int(3))]));
    client.client.take_events();

    let mut message = SyncMessage::new();
    message.insert_component(
        hunter,
        kinds.target,
        ComponentEntry::Patch(diff(
            &target(&GlobalEntity::from_u64(1)),
            &target(&GlobalEntity::from_u64(77)),
            &BTreeSet::new(),
        )),
    );

    assert_eq!(client.apply(message), 0);
    assert_eq!(client.world.entity_count(), 1);
    assert_eq!(client.client.mirrored_entities(), 1);
    assert_eq!(client.local(&GlobalEntity::from_u64(77)), None);
    assert_eq!(client.value(&hunter, &kinds.target), Some(&Value::Int(3)));
    let events: Vec<ClientEvent<TestEntity>> = client.client.take_events().read().collect();
    assert!(matches!(
        events.as_slice(),
        [ClientEvent::Desync(ClientError::Desync { .. })]
    ));
}

#[test]
fn test_self_reference_does_not_spawn_twice() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(1);

    client.apply(init_message(entity, vec![(kinds.target, target(&entity))]));

    let local_entity = client.local(&entity).expect("mirrored");
    assert_eq!(client.world.entity_count(), 1);
    assert_eq!(client.value(&entity, &kinds.target), Some(&target(&local_entity)));
}

#[test]
fn test_linked_entity_receives_payloads() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(5);
    let prototype = client.world.spawn_entity();

    assert_eq!(client.client.link_entity(entity, prototype), None);
    client.apply(init_message(entity, vec![(kinds.position, position(1, 1))]));

    assert_eq!(client.local(&entity), Some(prototype));
    assert_eq!(client.world.entity_count(), 1);
    assert_eq!(
        client.world.component(&prototype, &kinds.position),
        Some(&position(1, 1))
    );
    let events: Vec<ClientEvent<TestEntity>> = client.client.take_events().read().collect();
    assert_eq!(
        events,
        vec![
            ClientEvent::Link(prototype, entity),
            ClientEvent::Insert(prototype, kinds.position)
        ]
    );
}

#[test]
fn test_unregistered_component_is_dropped_individually() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let entity = GlobalEntity::from_u64(5);
    let mut foreign_kinds = ComponentKinds::new();
    let mut foreign = None;
    for name in ["A", "B", "C", "D", "E"] {
        foreign = foreign_kinds.add_component(name).ok();
    }
    let foreign = foreign.expect("fifth kind");

    let mut message = init_message(entity, vec![(kinds.position, position(1, 1))]);
    message.insert_component(entity, foreign, ComponentEntry::Init(Value::Null));

    assert_eq!(client.apply(message), 1);
    assert_eq!(client.value(&entity, &kinds.position), Some(&position(1, 1)));
    assert_eq!(client.value(&entity, &foreign), None);
}

#[test]
fn test_garbage_collection_despawns_dead_entities() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::new(1);
    let alive = GlobalEntity::from_u64(1);
    let dead = GlobalEntity::from_u64(2);
    client.apply(init_message(alive, vec![(kinds.position, position(0, 0))]));
    client.apply(init_message(dead, vec![(kinds.position, position(0, 0))]));
    let dead_local = client.local(&dead).expect("mirrored");

    let live_set: HashSet<GlobalEntity> = [alive].into_iter().collect();
    let collected = client
        .client
        .collect_garbage(&mut client.world, &|entity: &GlobalEntity| live_set.contains(entity));

    assert_eq!(collected, 1);
    assert!(client.has_entity(&alive));
    assert!(!client.world.has_entity(&dead_local));
    assert_eq!(client.local(&dead), None);
}

#[test]
fn test_garbage_collection_prunes_locally_despawned_mappings() {
    init_logger();
    let kinds = TestKinds::new();
    let entity = GlobalEntity::from_u64(1);
    let always_alive = |_: &GlobalEntity| true;

    let mut pruning = TestClient::new(1);
    pruning.apply(init_message(entity, vec![(kinds.position, position(0, 0))]));
    let local_entity = pruning.local(&entity).expect("mirrored");
    pruning.world.despawn_entity(&local_entity);
    assert_eq!(pruning.client.collect_garbage(&mut pruning.world, &always_alive), 1);
    assert_eq!(pruning.local(&entity), None);

    let mut keeping = TestClient::with_config(
        2,
        ClientConfig {
            prune_despawned_entities: false,
            ..ClientConfig::default()
        },
    );
    keeping.apply(init_message(entity, vec![(kinds.position, position(0, 0))]));
    let local_entity = keeping.local(&entity).expect("mirrored");
    keeping.world.despawn_entity(&local_entity);
    assert_eq!(keeping.client.collect_garbage(&mut keeping.world, &always_alive), 0);
    assert_eq!(keeping.local(&entity), Some(local_entity));

    // a later init respawns instead of writing into the despawned entity
    keeping.apply(init_message(entity, vec![(kinds.position, position(1, 1))]));
    assert!(keeping.has_entity(&entity));
    assert_eq!(keeping.value(&entity, &kinds.position), Some(&position(1, 1)));
}

#[test]
fn test_malformed_payload_is_rejected() {
    init_logger();
    let mut client = TestClient::new(1);

    let result = client
        .client
        .receive_payload(&mut client.world, &[0xff, 0x00, 0x13]);

    assert!(matches!(result, Err(ClientError::Validation(_))));
    assert_eq!(client.world.entity_count(), 0);
}

#[test]
fn test_desync_events_can_be_disabled() {
    init_logger();
    let kinds = TestKinds::new();
    let mut client = TestClient::with_config(
        1,
        ClientConfig {
            record_desync_events: false,
            ..ClientConfig::default()
        },
    );

    let mut message = SyncMessage::new();
    message.insert_component(
        GlobalEntity::from_u64(1),
        kinds.health,
        ComponentEntry::Patch(diff(&health(1), &health(2), &BTreeSet::new())),
    );
    client.apply(message);

    assert!(client.client.take_events().is_empty());
}
