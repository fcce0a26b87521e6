//! Error type shared by the map API and key encoders.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to callers of [`ArtMap`](crate::ArtMap).
///
/// Internal invariant violations (removing a partial key a node does not
/// hold, growing a node that still has room, ...) are not represented here:
/// they panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The key encoder could not turn the key into bytes.
    #[error("key encoding failed: {0}")]
    Encoding(String),
    /// The map was structurally modified after a [`Walker`](crate::Walker)
    /// was created, other than through the walker itself.
    #[error("map was structurally modified during iteration")]
    ConcurrentModification,
}
