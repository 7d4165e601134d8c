use replica_shared::GlobalEntity;

/// External signal telling whether an authoritative Entity still exists,
/// consulted during garbage collection so the mirror stays bounded even
/// when an entity removal never arrives.
pub trait EntityLiveness {
    fn is_alive(&self, entity: &GlobalEntity) -> bool;
}

impl<F: Fn(&GlobalEntity) -> bool> EntityLiveness for F {
    fn is_alive(&self, entity: &GlobalEntity) -> bool {
        self(entity)
    }
}
