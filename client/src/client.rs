use log::{debug, info, warn};

use replica_shared::{
    apply, decode_message, for_each_entity_in_patch_mut, for_each_entity_mut, ComponentEntry,
    ComponentKind, EntityEntry, EntityKey, GlobalEntity, Patch, PayloadReceiver, Protocol,
    SyncMessage, Value, WorldMutType,
};

use crate::{
    world::{entity_liveness::EntityLiveness, local_entity_map::LocalEntityMap},
    ClientConfig, ClientError, ClientEvent, ClientEvents, DesyncReason,
};

/// The consuming side of replication. Applies incoming payloads to a local
/// mirror of the authoritative store, translating authoritative Entity ids
/// to local ones as it goes.
pub struct Client<E: EntityKey> {
    config: ClientConfig,
    protocol: Protocol,
    entity_map: LocalEntityMap<E>,
    events: ClientEvents<E>,
}

impl<E: EntityKey> Client<E> {
    /// Create a new Client
    pub fn new(client_config: ClientConfig, mut protocol: Protocol) -> Self {
        if !protocol.is_locked() {
            protocol.lock();
        }

        Self {
            config: client_config,
            protocol,
            entity_map: LocalEntityMap::new(),
            events: ClientEvents::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    // Payloads

    /// Applies one payload, entity by entity then component by component.
    /// A bad entry is logged and dropped without affecting the rest of the
    /// payload. Returns the number of entries that changed the mirror.
    pub fn sync<W: WorldMutType<E>>(&mut self, world: &mut W, message: SyncMessage) -> usize {
        let mut applied = 0;

        for (global_entity, entity_entry) in message {
            match entity_entry {
                EntityEntry::Removed => {
                    if self.despawn_mirrored(world, &global_entity) {
                        applied += 1;
                    }
                }
                EntityEntry::Components(components) => {
                    for (component_kind, component_entry) in components {
                        match self.apply_component(world, global_entity, component_kind, component_entry) {
                            Ok(true) => applied += 1,
                            Ok(false) => {}
                            Err(error) => self.report(error),
                        }
                    }
                }
            }
        }

        applied
    }

    /// Decodes a wire payload and applies it. A malformed payload is logged
    /// and dropped as a whole.
    pub fn receive_payload<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        bytes: &[u8],
    ) -> Result<usize, ClientError> {
        let message = match decode_message(bytes) {
            Ok(message) => message,
            Err(error) => {
                let error = ClientError::from(error);
                warn!("{}", error);
                return Err(error);
            }
        };
        Ok(self.sync(world, message))
    }

    /// Applies every payload currently waiting on the transport
    pub fn receive_all<W: WorldMutType<E>, R: PayloadReceiver + ?Sized>(
        &mut self,
        world: &mut W,
        receiver: &mut R,
    ) -> Result<usize, ClientError> {
        let mut applied = 0;
        while let Some(bytes) = receiver.receive()? {
            if let Ok(count) = self.receive_payload(world, &bytes) {
                applied += count;
            }
        }
        Ok(applied)
    }

    // Entities

    /// Binds an existing local Entity to an authoritative id, so payloads
    /// for that id land on it instead of spawning a new one. Returns the
    /// local Entity previously bound to the id.
    pub fn link_entity(&mut self, global_entity: GlobalEntity, local_entity: E) -> Option<E> {
        debug!("Linking {} to a local Entity", global_entity);
        let previous = self.entity_map.insert(global_entity, local_entity);
        self.events.push(ClientEvent::Link(local_entity, global_entity));
        previous
    }

    pub fn local_entity(&self, global_entity: &GlobalEntity) -> Option<E> {
        self.entity_map.local_entity(global_entity)
    }

    pub fn global_entity(&self, local_entity: &E) -> Option<GlobalEntity> {
        self.entity_map.global_entity(local_entity)
    }

    /// Number of authoritative Entities currently mirrored
    pub fn mirrored_entities(&self) -> usize {
        self.entity_map.len()
    }

    /// Once per tick: despawns mirrored Entities the liveness signal reports
    /// gone and forgets mappings whose local Entity the application
    /// despawned. Returns the number of mappings dropped.
    pub fn collect_garbage<W: WorldMutType<E>, L: EntityLiveness + ?Sized>(
        &mut self,
        world: &mut W,
        liveness: &L,
    ) -> usize {
        let mut collected = 0;

        for (global_entity, local_entity) in self.entity_map.entries() {
            if !world.has_entity(&local_entity) {
                if self.config.prune_despawned_entities {
                    self.entity_map.remove_by_global(&global_entity);
                    collected += 1;
                }
                continue;
            }
            if !liveness.is_alive(&global_entity) && self.despawn_mirrored(world, &global_entity) {
                collected += 1;
            }
        }

        if collected > 0 {
            info!("Garbage collection dropped {} mirrored Entities", collected);
        }
        collected
    }

    /// Events recorded since the last call
    pub fn take_events(&mut self) -> ClientEvents<E> {
        std::mem::take(&mut self.events)
    }

    // Private methods

    fn apply_component<W: WorldMutType<E>>(
        &mut self,
        world: &mut W,
        global_entity: GlobalEntity,
        component_kind: ComponentKind,
        component_entry: ComponentEntry,
    ) -> Result<bool, ClientError> {
        if !self.protocol.component_kinds.contains(&component_kind) {
            return Err(ClientError::UnknownComponent {
                entity: global_entity,
                component_kind,
            });
        }

        match component_entry {
            ComponentEntry::Removed => {
                let Some(local_entity) = self.entity_map.local_entity(&global_entity) else {
                    return Ok(false);
                };
                if world.remove_component(&local_entity, &component_kind).is_none() {
                    return Ok(false);
                }
                self.events
                    .push(ClientEvent::Remove(local_entity, component_kind));
                Ok(true)
            }
            ComponentEntry::Init(mut value) => {
                let local_entity = self.resolve_or_spawn(world, global_entity);
                self.translate_value(world, &mut value);
                let event = match world.insert_component(&local_entity, component_kind, value) {
                    Some(_) => ClientEvent::Update(local_entity, component_kind),
                    None => ClientEvent::Insert(local_entity, component_kind),
                };
                self.events.push(event);
                Ok(true)
            }
            ComponentEntry::Patch(mut patch) => {
                let desync = |reason: DesyncReason| ClientError::Desync {
                    entity: global_entity,
                    component_kind,
                    reason,
                };

                let local_entity = match self.entity_map.local_entity(&global_entity) {
                    Some(local_entity) if world.has_component(&local_entity, &component_kind) => {
                        local_entity
                    }
                    _ => return Err(desync(DesyncReason::MissingBase)),
                };

                // entity ids are leaves to `apply`, so the patch fits the
                // base before translation exactly when it fits after
                let Some(base) = world.component(&local_entity, &component_kind) else {
                    return Err(desync(DesyncReason::MissingBase));
                };
                let mut updated = apply(base, &patch).map_err(|error| desync(error.into()))?;
                if self.translate_patch(world, &mut patch) > 0 {
                    let Some(base) = world.component(&local_entity, &component_kind) else {
                        return Err(desync(DesyncReason::MissingBase));
                    };
                    updated = apply(base, &patch).map_err(|error| desync(error.into()))?;
                }

                world.insert_component(&local_entity, component_kind, updated);
                self.events
                    .push(ClientEvent::Update(local_entity, component_kind));
                Ok(true)
            }
        }
    }

    fn despawn_mirrored<W: WorldMutType<E>>(&mut self, world: &mut W, global_entity: &GlobalEntity) -> bool {
        let Some(local_entity) = self.entity_map.remove_by_global(global_entity) else {
            return false;
        };
        if world.has_entity(&local_entity) {
            world.despawn_entity(&local_entity);
            self.events.push(ClientEvent::Despawn(local_entity));
        }
        debug!("{} despawned", global_entity);
        true
    }

    fn resolve_or_spawn<W: WorldMutType<E>>(&mut self, world: &mut W, global_entity: GlobalEntity) -> E {
        resolve_or_spawn(&mut self.entity_map, &mut self.events, world, global_entity)
    }

    /// Rewrites authoritative Entity references to local ones, spawning a
    /// local Entity for any id seen for the first time
    fn translate_value<W: WorldMutType<E>>(&mut self, world: &mut W, value: &mut Value) {
        let entity_map = &mut self.entity_map;
        let events = &mut self.events;
        for_each_entity_mut(value, |id| {
            let local_entity = resolve_or_spawn(entity_map, events, world, GlobalEntity::from_u64(*id));
            *id = local_entity.to_u64();
        });
    }

    /// Returns the number of references translated
    fn translate_patch<W: WorldMutType<E>>(&mut self, world: &mut W, patch: &mut Patch) -> usize {
        let entity_map = &mut self.entity_map;
        let events = &mut self.events;
        let mut translated = 0;
        for_each_entity_in_patch_mut(patch, |id| {
            let local_entity = resolve_or_spawn(entity_map, events, world, GlobalEntity::from_u64(*id));
            *id = local_entity.to_u64();
            translated += 1;
        });
        translated
    }

    fn report(&mut self, error: ClientError) {
        warn!("{}", error);
        if self.config.record_desync_events && matches!(error, ClientError::Desync { .. }) {
            self.events.push(ClientEvent::Desync(error));
        }
    }
}

fn resolve_or_spawn<E: EntityKey, W: WorldMutType<E>>(
    entity_map: &mut LocalEntityMap<E>,
    events: &mut ClientEvents<E>,
    world: &mut W,
    global_entity: GlobalEntity,
) -> E {
    if let Some(local_entity) = entity_map.local_entity(&global_entity) {
        if world.has_entity(&local_entity) {
            return local_entity;
        }
    }
    let local_entity = world.spawn_entity();
    entity_map.insert(global_entity, local_entity);
    events.push(ClientEvent::Spawn(local_entity));
    debug!("{} spawned locally", global_entity);
    local_entity
}
