use std::collections::{HashMap, HashSet};

use log::debug;

use replica_shared::{ComponentKind, EntityKey, GlobalEntity, SubscriberKey, Value};

use crate::{ReplicationMode, ReplicationPolicy};

/// Tracks, per (entity, component) pair, which Subscribers may currently see it
pub struct VisibilityResolver<E: EntityKey> {
    connected: HashSet<SubscriberKey>,
    visibility: HashMap<(E, ComponentKind), HashSet<SubscriberKey>>,
    entity_kinds: HashMap<E, HashSet<ComponentKind>>,
    pending_connects: HashMap<E, HashSet<SubscriberKey>>,
}

impl<E: EntityKey> Default for VisibilityResolver<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityKey> VisibilityResolver<E> {
    pub fn new() -> Self {
        Self {
            connected: HashSet::new(),
            visibility: HashMap::new(),
            entity_kinds: HashMap::new(),
            pending_connects: HashMap::new(),
        }
    }

    // Subscribers

    /// Returns false if the Subscriber was already connected
    pub fn connect(&mut self, subscriber: SubscriberKey) -> bool {
        self.connected.insert(subscriber)
    }

    /// Removes the Subscriber from the connected set and from every
    /// visibility set. Returns false if it was not connected.
    pub fn disconnect(&mut self, subscriber: &SubscriberKey) -> bool {
        let was_connected = self.connected.remove(subscriber);
        for subscribers in self.visibility.values_mut() {
            subscribers.remove(subscriber);
        }
        self.pending_connects.retain(|_, subscribers| {
            subscribers.remove(subscriber);
            !subscribers.is_empty()
        });
        was_connected
    }

    pub fn is_connected(&self, subscriber: &SubscriberKey) -> bool {
        self.connected.contains(subscriber)
    }

    /// Connected Subscribers, in key order
    pub fn connected_subscribers(&self) -> Vec<SubscriberKey> {
        let mut subscribers: Vec<SubscriberKey> = self.connected.iter().copied().collect();
        subscribers.sort();
        subscribers
    }

    // Pairs

    pub fn is_tracked(&self, entity: &E, component_kind: &ComponentKind) -> bool {
        self.visibility.contains_key(&(*entity, *component_kind))
    }

    /// Starts tracking a newly observed pair and returns the Subscribers it is
    /// initially visible to. AllAtOnce evaluates the policy against every
    /// connected Subscriber; PerSubscriberConnection starts out invisible,
    /// except to Subscribers connected to the entity before it was attached.
    ///
    /// Attaching a pair that is already tracked changes nothing and returns
    /// its current visibility.
    pub fn attach(
        &mut self,
        entity: E,
        component_kind: ComponentKind,
        value: &Value,
        policy: &ReplicationPolicy,
    ) -> Vec<SubscriberKey> {
        if let Some(subscribers) = self.visibility.get(&(entity, component_kind)) {
            return sorted(subscribers);
        }

        let global_entity = GlobalEntity::from_entity(&entity);
        let candidates: Vec<SubscriberKey> = match policy.mode() {
            ReplicationMode::AllAtOnce => self.connected.iter().copied().collect(),
            ReplicationMode::PerSubscriberConnection => match self.pending_connects.get(&entity) {
                Some(pending) => pending.intersection(&self.connected).copied().collect(),
                None => Vec::new(),
            },
        };
        let subscribers: HashSet<SubscriberKey> = candidates
            .into_iter()
            .filter(|subscriber| policy.admits(subscriber, &global_entity, value))
            .collect();

        debug!(
            "VisibilityResolver: tracking {} of {}, visible to {} subscriber(s)",
            component_kind,
            global_entity,
            subscribers.len()
        );

        let visible = sorted(&subscribers);
        self.visibility.insert((entity, component_kind), subscribers);
        self.entity_kinds
            .entry(entity)
            .or_default()
            .insert(component_kind);
        visible
    }

    /// Evaluates the policy for one connected Subscriber against a tracked
    /// pair it cannot see yet. Returns true if the Subscriber was newly added
    /// to the pair's visibility set.
    pub fn admit(
        &mut self,
        subscriber: &SubscriberKey,
        entity: &E,
        component_kind: &ComponentKind,
        value: &Value,
        policy: &ReplicationPolicy,
    ) -> bool {
        if !self.connected.contains(subscriber) {
            return false;
        }
        let Some(subscribers) = self.visibility.get_mut(&(*entity, *component_kind)) else {
            return false;
        };
        if subscribers.contains(subscriber) {
            return false;
        }
        if !policy.admits(subscriber, &GlobalEntity::from_entity(entity), value) {
            return false;
        }
        subscribers.insert(*subscriber);
        true
    }

    /// Connects a Subscriber to an entity whose pairs are not attached yet.
    /// Every pair of the entity attached before `clear_pending_connects`
    /// evaluates the Subscriber, whatever its replication mode.
    pub fn schedule_connect(&mut self, subscriber: SubscriberKey, entity: E) -> bool {
        if !self.connected.contains(&subscriber) {
            return false;
        }
        self.pending_connects
            .entry(entity)
            .or_default()
            .insert(subscriber)
    }

    pub fn has_pending_connect(&self, subscriber: &SubscriberKey, entity: &E) -> bool {
        self.pending_connects
            .get(entity)
            .is_some_and(|subscribers| subscribers.contains(subscriber))
    }

    /// Forgets every scheduled connect, once the pairs they were waiting for
    /// have been attached
    pub fn clear_pending_connects(&mut self) {
        self.pending_connects.clear();
    }

    pub fn is_visible(
        &self,
        subscriber: &SubscriberKey,
        entity: &E,
        component_kind: &ComponentKind,
    ) -> bool {
        self.visibility
            .get(&(*entity, *component_kind))
            .is_some_and(|subscribers| subscribers.contains(subscriber))
    }

    /// Subscribers the pair is visible to, in key order
    pub fn visible_subscribers(&self, entity: &E, component_kind: &ComponentKind) -> Vec<SubscriberKey> {
        match self.visibility.get(&(*entity, *component_kind)) {
            Some(subscribers) => sorted(subscribers),
            None => Vec::new(),
        }
    }

    /// Stops tracking a pair, returning the Subscribers that could see it
    pub fn clear_component(&mut self, entity: &E, component_kind: &ComponentKind) -> Vec<SubscriberKey> {
        if let Some(kinds) = self.entity_kinds.get_mut(entity) {
            kinds.remove(component_kind);
            if kinds.is_empty() {
                self.entity_kinds.remove(entity);
            }
        }
        match self.visibility.remove(&(*entity, *component_kind)) {
            Some(subscribers) => sorted(&subscribers),
            None => Vec::new(),
        }
    }

    /// Stops tracking every pair of the entity
    pub fn clear_entity(&mut self, entity: &E) {
        self.pending_connects.remove(entity);
        let Some(kinds) = self.entity_kinds.remove(entity) else {
            return;
        };
        for component_kind in kinds {
            self.visibility.remove(&(*entity, component_kind));
        }
    }

    pub fn tracked_pairs(&self) -> Vec<(E, ComponentKind)> {
        self.visibility.keys().copied().collect()
    }

    /// Tracked kinds of one entity, in kind order
    pub fn entity_component_kinds(&self, entity: &E) -> Vec<ComponentKind> {
        let mut kinds: Vec<ComponentKind> = match self.entity_kinds.get(entity) {
            Some(kinds) => kinds.iter().copied().collect(),
            None => Vec::new(),
        };
        kinds.sort();
        kinds
    }
}

fn sorted(subscribers: &HashSet<SubscriberKey>) -> Vec<SubscriberKey> {
    let mut list: Vec<SubscriberKey> = subscribers.iter().copied().collect();
    list.sort();
    list
}
