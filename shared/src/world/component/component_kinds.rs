use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// ComponentKind - should be one unique value for each type of Component
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentKind(u16);

impl ComponentKind {
    pub fn net_id(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.0)
    }
}

/// A map to hold all component types
#[derive(Clone, Default)]
pub struct ComponentKinds {
    current_net_id: u16,
    name_map: HashMap<String, ComponentKind>,
    kind_map: HashMap<ComponentKind, String>,
}

impl ComponentKinds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, name: &str) -> Result<ComponentKind, ProtocolError> {
        if self.name_map.contains_key(name) {
            return Err(ProtocolError::DuplicateComponent {
                name: name.to_string(),
            });
        }

        let component_kind = ComponentKind(self.current_net_id);
        self.name_map.insert(name.to_string(), component_kind);
        self.kind_map.insert(component_kind, name.to_string());
        self.current_net_id += 1;

        Ok(component_kind)
    }

    pub fn kind_of(&self, name: &str) -> Option<ComponentKind> {
        self.name_map.get(name).copied()
    }

    pub fn kind_to_name(&self, component_kind: &ComponentKind) -> Option<&str> {
        self.kind_map.get(component_kind).map(String::as_str)
    }

    pub fn contains(&self, component_kind: &ComponentKind) -> bool {
        self.kind_map.contains_key(component_kind)
    }

    /// All registered kinds, in registration order
    pub fn kinds(&self) -> Vec<ComponentKind> {
        (0..self.current_net_id).map(ComponentKind).collect()
    }

    pub fn len(&self) -> usize {
        self.kind_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kind_map.is_empty()
    }
}
