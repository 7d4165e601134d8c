use thiserror::Error;

/// Errors that can occur while applying a Patch
///
/// Any of these means the receiving side no longer holds the base value the
/// Patch was computed against (a desync).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    /// Patch shape does not match the shape of the base value
    #[error("Cannot apply {expected} patch at `{path}` - base value is a {found}")]
    Incompatible {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Sequence patch addresses an element the base value does not have
    #[error("Cannot patch element {index} at `{path}` - base sequence has {base_len} elements and patch does not supply it")]
    MissingElement {
        path: String,
        index: usize,
        base_len: usize,
    },
}
