/// An entity handle that can be carried through replicated values as a raw
/// `u64`, both in the authoritative store and in the local mirror.
pub trait EntityKey: Copy + Eq + std::hash::Hash {
    fn to_u64(&self) -> u64;
    fn from_u64(value: u64) -> Self;
}
