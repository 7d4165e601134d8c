use std::vec::IntoIter;

use replica_shared::{ComponentKind, GlobalEntity};

use crate::ClientError;

/// What happened to the local mirror while reconciling
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent<E> {
    Spawn(E),
    Despawn(E),
    /// A local Entity was bound to an authoritative id with `link_entity`
    Link(E, GlobalEntity),
    Insert(E, ComponentKind),
    Update(E, ComponentKind),
    Remove(E, ComponentKind),
    Desync(ClientError),
}

pub struct ClientEvents<E> {
    events: Vec<ClientEvent<E>>,
    empty: bool,
}

impl<E> Default for ClientEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ClientEvents<E> {
    pub(crate) fn new() -> Self {
        Self {
            events: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClientEvent<E>> {
        self.events.iter()
    }

    pub fn read(&mut self) -> IntoIter<ClientEvent<E>> {
        let list = std::mem::take(&mut self.events);
        self.empty = true;
        IntoIterator::into_iter(list)
    }

    /// Desync errors recorded since the events were last read
    pub fn desyncs(&self) -> Vec<&ClientError> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ClientEvent::Desync(error) => Some(error),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn push(&mut self, event: ClientEvent<E>) {
        self.events.push(event);
        self.empty = false;
    }
}
