use thiserror::Error;

/// The error returned when looking up a key that is not in the tree.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Error)]
#[error("key not found")]
pub struct KeyNotFound;
