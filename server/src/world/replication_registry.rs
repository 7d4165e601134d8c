use std::collections::HashMap;

use log::info;

use replica_shared::{ComponentKind, ComponentKinds, Protocol};

use crate::{ReplicationPolicy, ServerError};

/// Component type -> replication policy, built once at startup
#[derive(Clone)]
pub struct ReplicationRegistry {
    protocol: Protocol,
    policies: HashMap<ComponentKind, ReplicationPolicy>,
}

impl ReplicationRegistry {
    pub fn builder(protocol: &Protocol) -> ReplicationRegistryBuilder {
        ReplicationRegistryBuilder {
            protocol: protocol.clone(),
            policies: HashMap::new(),
        }
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn component_kinds(&self) -> &ComponentKinds {
        &self.protocol.component_kinds
    }

    /// All replicated kinds, in registration order
    pub fn kinds(&self) -> Vec<ComponentKind> {
        self.protocol.component_kinds.kinds()
    }

    pub fn policy(&self, component_kind: &ComponentKind) -> Option<&ReplicationPolicy> {
        self.policies.get(component_kind)
    }

    pub fn try_policy(&self, component_kind: &ComponentKind) -> Result<&ReplicationPolicy, ServerError> {
        self.policies
            .get(component_kind)
            .ok_or(ServerError::UnknownComponent {
                component_kind: *component_kind,
            })
    }

    pub fn kind_name(&self, component_kind: &ComponentKind) -> String {
        match self.protocol.component_kinds.kind_to_name(component_kind) {
            Some(name) => name.to_string(),
            None => component_kind.to_string(),
        }
    }
}

pub struct ReplicationRegistryBuilder {
    protocol: Protocol,
    policies: HashMap<ComponentKind, ReplicationPolicy>,
}

impl ReplicationRegistryBuilder {
    pub fn register(
        &mut self,
        component_name: &str,
        policy: ReplicationPolicy,
    ) -> Result<&mut Self, ServerError> {
        let Some(component_kind) = self.protocol.component_kinds.kind_of(component_name) else {
            return Err(ServerError::Misconfiguration {
                component: component_name.to_string(),
                reason: "policy registered for a component the Protocol does not know",
            });
        };
        if self.policies.contains_key(&component_kind) {
            return Err(ServerError::Misconfiguration {
                component: component_name.to_string(),
                reason: "policy registered more than once",
            });
        }
        self.policies.insert(component_kind, policy);
        Ok(self)
    }

    /// Registers the default policy (AllAtOnce, no predicate) for every
    /// Protocol component that has none yet
    pub fn register_remaining_defaults(&mut self) -> &mut Self {
        for component_kind in self.protocol.component_kinds.kinds() {
            self.policies.entry(component_kind).or_default();
        }
        self
    }

    pub fn build(&mut self) -> Result<ReplicationRegistry, ServerError> {
        if !self.protocol.is_locked() {
            return Err(ServerError::Misconfiguration {
                component: "<protocol>".to_string(),
                reason: "Protocol must be locked before replication starts",
            });
        }

        for component_kind in self.protocol.component_kinds.kinds() {
            if !self.policies.contains_key(&component_kind) {
                let component = self
                    .protocol
                    .component_kinds
                    .kind_to_name(&component_kind)
                    .unwrap_or_default()
                    .to_string();
                return Err(ServerError::Misconfiguration {
                    component,
                    reason: "component is replicated but has no registered policy",
                });
            }
        }

        info!(
            "ReplicationRegistry: {} replicated component(s) registered",
            self.policies.len()
        );

        Ok(ReplicationRegistry {
            protocol: self.protocol.clone(),
            policies: std::mem::take(&mut self.policies),
        })
    }
}
