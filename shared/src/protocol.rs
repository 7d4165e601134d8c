use crate::world::component::component_kinds::{ComponentKind, ComponentKinds};

pub mod error;
pub use error::ProtocolError;

// Protocol
/// Static registry of replicable Component types, shared verbatim by the
/// authoritative side and every subscriber so that `ComponentKind`s agree.
#[derive(Clone, Default)]
pub struct Protocol {
    pub component_kinds: ComponentKinds,
    locked: bool,
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_component(&mut self, name: &str) -> &mut Self {
        self.check_lock();
        if let Err(err) = self.component_kinds.add_component(name) {
            panic!("{}", err);
        }
        self
    }

    // Non-panicking builder methods

    pub fn try_add_component(&mut self, name: &str) -> Result<&mut Self, ProtocolError> {
        self.try_check_lock()?;
        self.component_kinds.add_component(name)?;
        Ok(self)
    }

    pub fn try_lock(&mut self) -> Result<(), ProtocolError> {
        self.try_check_lock()?;
        self.locked = true;
        Ok(())
    }

    pub fn lock(&mut self) {
        self.check_lock();
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Checks if protocol is locked without panicking
    /// Returns Err if protocol is locked
    pub fn try_check_lock(&self) -> Result<(), ProtocolError> {
        if self.locked {
            Err(ProtocolError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    /// Checks if protocol is locked, panics if it is
    pub fn check_lock(&self) {
        if self.locked {
            panic!("Protocol already locked!");
        }
    }

    pub fn component_kind(&self, name: &str) -> Result<ComponentKind, ProtocolError> {
        self.component_kinds
            .kind_of(name)
            .ok_or_else(|| ProtocolError::UnknownComponent {
                name: name.to_string(),
            })
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }
}
