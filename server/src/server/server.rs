use std::mem;

use log::{debug, info, warn};

use replica_shared::{
    encode_message, strip_fields, ComponentKind, EntityKey, GlobalEntity, PayloadSender,
    SubscriberKey, Tick, Value, WorldMutType, WorldRefType,
};

use crate::{
    world::{entity_mut::EntityMut, entity_ref::EntityRef},
    ChangeFeed, ReplicationMode, ReplicationRegistry, ServerConfig, ServerError, SyncBatch,
    SyncBatcher, SyncEvents, VisibilityResolver,
};

/// The authoritative side of replication. Tracks mutations of registered
/// Components, decides which Subscribers may see each of them, and once per
/// tick builds one incremental payload for every Subscriber with something
/// to learn.
pub struct Server<E: EntityKey> {
    config: ServerConfig,
    registry: ReplicationRegistry,
    change_feed: ChangeFeed<E>,
    visibility: VisibilityResolver<E>,
    batcher: SyncBatcher,
    batch: SyncBatch,
    current_tick: Tick,
    sync_events: SyncEvents,
}

impl<E: EntityKey> Server<E> {
    /// Create a new Server. The registry has already been validated, so a
    /// Server never runs with a misconfigured Component.
    pub fn new(server_config: ServerConfig, registry: ReplicationRegistry) -> Self {
        let mut change_feed = ChangeFeed::new(server_config.coalesce_transient_components);
        for component_kind in registry.kinds() {
            change_feed.subscribe(component_kind);
        }

        info!(
            "Server started, replicating {} component kind(s)",
            change_feed.kinds().len()
        );

        Self {
            batcher: SyncBatcher::new(server_config.skip_empty_patches),
            config: server_config,
            registry,
            change_feed,
            visibility: VisibilityResolver::new(),
            batch: SyncBatch::new(0),
            current_tick: 0,
            sync_events: SyncEvents::new(),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ReplicationRegistry {
        &self.registry
    }

    pub fn component_kind(&self, name: &str) -> Result<ComponentKind, ServerError> {
        Ok(self.registry.protocol().component_kind(name)?)
    }

    /// Tick the next flush will be stamped with
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    // Subscribers

    /// Marks the Subscriber connected and admits it to every tracked
    /// AllAtOnce pair its predicate allows, queueing an `init` for each in
    /// its next payload. Returns the number of pairs admitted.
    pub fn connect_subscriber_on_first_connection<W: WorldRefType<E>>(
        &mut self,
        world: &W,
        subscriber: SubscriberKey,
    ) -> usize {
        if !self.visibility.connect(subscriber) {
            debug!("Subscriber {:?} connected twice", subscriber);
        }

        let mut pairs = self.visibility.tracked_pairs();
        pairs.sort_by_key(|(entity, component_kind)| (entity.to_u64(), *component_kind));

        let mut admitted = 0;
        for (entity, component_kind) in pairs {
            let all_at_once = self
                .registry
                .policy(&component_kind)
                .is_some_and(|policy| policy.mode() == ReplicationMode::AllAtOnce);
            if all_at_once && self.catch_up(world, &subscriber, &entity, &component_kind) {
                admitted += 1;
            }
        }

        info!(
            "Subscriber {:?} connected, caught up on {} component(s)",
            subscriber, admitted
        );
        admitted
    }

    /// Evaluates every pair of one entity, of any replication mode, for a
    /// connected Subscriber. Pairs recorded this tick are evaluated when the
    /// next flush first attaches them. Returns the number of pairs admitted
    /// or scheduled.
    pub fn connect_subscriber_to_entity<W: WorldRefType<E>>(
        &mut self,
        world: &W,
        subscriber: &SubscriberKey,
        entity: &E,
    ) -> Result<usize, ServerError> {
        if !self.visibility.is_connected(subscriber) {
            return Err(ServerError::SubscriberNotConnected {
                subscriber: *subscriber,
            });
        }

        let mut admitted = 0;
        for component_kind in self.visibility.entity_component_kinds(entity) {
            if self.catch_up(world, subscriber, entity, &component_kind) {
                admitted += 1;
            }
        }

        let global_entity = GlobalEntity::from_entity(entity);
        let mut scheduled = 0;
        for component_kind in self.change_feed.observed_kinds(entity) {
            if self.visibility.is_tracked(entity, &component_kind) {
                continue;
            }
            let (Some(policy), Some(value)) = (
                self.registry.policy(&component_kind),
                self.change_feed.observed(entity, &component_kind),
            ) else {
                continue;
            };
            if policy.admits(subscriber, &global_entity, value) {
                scheduled += 1;
            }
        }
        if scheduled > 0 {
            self.visibility.schedule_connect(*subscriber, *entity);
            debug!(
                "Subscriber {:?} scheduled for {} pending component(s) of {}",
                subscriber, scheduled, global_entity
            );
        }

        Ok(admitted + scheduled)
    }

    /// Removes the Subscriber from every visibility set and discards what
    /// was queued for it this tick. Returns false if it was not connected.
    pub fn disconnect_subscriber(&mut self, subscriber: &SubscriberKey) -> bool {
        self.batch.drop_subscriber(subscriber);
        let was_connected = self.visibility.disconnect(subscriber);
        if was_connected {
            info!("Subscriber {:?} disconnected", subscriber);
        }
        was_connected
    }

    /// Queues a fresh `init` of a pair the Subscriber already sees, so that it
    /// can rebuild a base it lost. Returns false if the pair is not visible
    /// to the Subscriber.
    pub fn resync_component<W: WorldRefType<E>>(
        &mut self,
        world: &W,
        subscriber: &SubscriberKey,
        entity: &E,
        component_kind: &ComponentKind,
    ) -> Result<bool, ServerError> {
        if !self.visibility.is_connected(subscriber) {
            return Err(ServerError::SubscriberNotConnected {
                subscriber: *subscriber,
            });
        }
        let policy = self.registry.try_policy(component_kind)?;
        if !self.visibility.is_visible(subscriber, entity, component_kind) {
            return Ok(false);
        }
        let Some(value) = self.replicated_value(world, entity, component_kind) else {
            return Ok(false);
        };

        let init = strip_fields(value, policy.unreplicated_fields());
        self.batch
            .queue_init(*subscriber, GlobalEntity::from_entity(entity), *component_kind, init);
        debug!(
            "Resync of {} on {} queued for {:?}",
            component_kind,
            GlobalEntity::from_entity(entity),
            subscriber
        );
        Ok(true)
    }

    pub fn is_connected(&self, subscriber: &SubscriberKey) -> bool {
        self.visibility.is_connected(subscriber)
    }

    pub fn connected_subscribers(&self) -> Vec<SubscriberKey> {
        self.visibility.connected_subscribers()
    }

    pub fn is_visible(
        &self,
        subscriber: &SubscriberKey,
        entity: &E,
        component_kind: &ComponentKind,
    ) -> bool {
        self.visibility.is_visible(subscriber, entity, component_kind)
    }

    pub fn visible_subscribers(&self, entity: &E, component_kind: &ComponentKind) -> Vec<SubscriberKey> {
        self.visibility.visible_subscribers(entity, component_kind)
    }

    // Entities

    /// Creates a new Entity in the store and returns an EntityMut which can
    /// be used to attach Components to it
    pub fn spawn_entity<'s, W: WorldMutType<E>>(&'s mut self, world: &'s mut W) -> EntityMut<'s, E, W> {
        let entity = world.spawn_entity();
        EntityMut::new(self, world, &entity)
    }

    /// Retrieves an EntityMut that exposes read and write operations for the
    /// Entity.
    /// Panics if the Entity does not exist.
    pub fn entity_mut<'s, W: WorldMutType<E>>(
        &'s mut self,
        world: &'s mut W,
        entity: &E,
    ) -> EntityMut<'s, E, W> {
        if world.has_entity(entity) {
            return EntityMut::new(self, world, entity);
        }
        panic!("No Entity exists for given Key!");
    }

    /// Retrieves an EntityRef that exposes read-only operations for the
    /// Entity.
    /// Panics if the Entity does not exist.
    pub fn entity<'s, W: WorldRefType<E>>(&'s self, world: &'s W, entity: &E) -> EntityRef<'s, E, W> {
        if world.has_entity(entity) {
            return EntityRef::new(self, world, entity);
        }
        panic!("No Entity exists for given Key!");
    }

    /// Records a Component write the store has already applied
    pub fn insert_component_worldless(
        &mut self,
        entity: &E,
        component_kind: ComponentKind,
        value: Value,
    ) -> Result<(), ServerError> {
        self.registry.try_policy(&component_kind)?;
        self.change_feed.record_insert(*entity, component_kind, value);
        Ok(())
    }

    /// Records a Component removal the store has already applied. Returns
    /// false if the pair was never replicated.
    pub fn remove_component_worldless(&mut self, entity: &E, component_kind: &ComponentKind) -> bool {
        self.change_feed.record_remove(*entity, *component_kind, false)
    }

    /// Records destruction of an Entity the store has already applied
    pub fn despawn_entity_worldless(&mut self, entity: &E) {
        self.change_feed.record_despawn(*entity);
    }

    /// For stores that do not report their own mutations: compares the store
    /// against the last replicated values and records the differences
    pub fn detect_changes<W: WorldRefType<E>>(&mut self, world: &W) {
        self.change_feed.detect_changes(world);
    }

    /// Number of recorded mutations waiting for the next flush
    pub fn pending_changes(&self) -> usize {
        self.change_feed.pending()
    }

    // Sync

    /// Drains the ChangeFeed, batches every record and flushes one payload
    /// per Subscriber with something to learn. Payloads are read with
    /// `take_sync_events`. Returns the number of payloads produced.
    pub fn send_all_payloads(&mut self) -> Result<usize, ServerError> {
        let next_tick = self.current_tick.wrapping_add(1);
        let mut batch = mem::replace(&mut self.batch, SyncBatch::new(next_tick));
        let tick = batch.tick();

        for (component_kind, records) in self.change_feed.drain_all() {
            self.batcher.process(
                &mut batch,
                &self.registry,
                &mut self.visibility,
                component_kind,
                records,
            )?;
        }
        self.visibility.clear_pending_connects();

        let connected = self.visibility.connected_subscribers();
        let payloads = batch.flush(&connected);
        let produced = payloads.len();
        for (subscriber, message) in payloads {
            self.sync_events.push_payload(subscriber, tick, message);
        }
        self.current_tick = next_tick;

        debug!("Tick {}: {} payload(s) flushed", tick, produced);
        Ok(produced)
    }

    /// Same as `send_all_payloads`, then encodes every pending payload and
    /// hands it to the transport. A payload that cannot be delivered does
    /// not stop the others; the first failure is returned once all were
    /// attempted.
    pub fn send_all_payloads_to<S: PayloadSender + ?Sized>(
        &mut self,
        sender: &mut S,
    ) -> Result<usize, ServerError> {
        self.send_all_payloads()?;

        let mut sent = 0;
        let mut first_error = None;
        for event in self.sync_events.read() {
            let result = encode_message(&event.message)
                .map_err(|source| ServerError::Encode {
                    subscriber: event.subscriber,
                    source,
                })
                .and_then(|bytes| {
                    sender
                        .send(&event.subscriber, &bytes)
                        .map_err(|source| ServerError::Transport {
                            subscriber: event.subscriber,
                            source,
                        })
                });
            match result {
                Ok(()) => sent += 1,
                Err(err) => {
                    warn!("{}", err);
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(sent),
        }
    }

    /// Payloads flushed since the last call
    pub fn take_sync_events(&mut self) -> SyncEvents {
        mem::replace(&mut self.sync_events, SyncEvents::new())
    }

    // Private methods

    fn catch_up<W: WorldRefType<E>>(
        &mut self,
        world: &W,
        subscriber: &SubscriberKey,
        entity: &E,
        component_kind: &ComponentKind,
    ) -> bool {
        let Some(policy) = self.registry.policy(component_kind) else {
            return false;
        };
        let Some(current) = world.component(entity, component_kind) else {
            return false;
        };
        // other Subscribers will reach the last recorded value once pending
        // records flush, so that is the base to hand out
        let value = self
            .change_feed
            .observed(entity, component_kind)
            .unwrap_or(current);
        if !self
            .visibility
            .admit(subscriber, entity, component_kind, value, policy)
        {
            return false;
        }

        let init = strip_fields(value, policy.unreplicated_fields());
        self.batch
            .queue_init(*subscriber, GlobalEntity::from_entity(entity), *component_kind, init);
        true
    }

    fn replicated_value<'w, W: WorldRefType<E>>(
        &'w self,
        world: &'w W,
        entity: &E,
        component_kind: &ComponentKind,
    ) -> Option<&'w Value> {
        let current = world.component(entity, component_kind)?;
        Some(
            self.change_feed
                .observed(entity, component_kind)
                .unwrap_or(current),
        )
    }
}
