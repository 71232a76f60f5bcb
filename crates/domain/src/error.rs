//! Unified error type for the domain layer.

use thiserror::Error;

/// Errors raised by domain validation and decoding.
///
/// These indicate a protocol/logic mismatch rather than a transient
/// condition: callers are expected to abort the enclosing step, not retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A bit-packed identifier was malformed or too short to decode.
    #[error("gen id '{0}' cannot be decoded")]
    InvalidGenId(String),

    /// An out-of-bounds coordinate, or a mutation against the wrong tile kind.
    #[error("invalid map indices: {0}")]
    InvalidMapIndices(String),

    /// Lookup of a hero id not present in the current squad snapshot.
    #[error("hero with id '{0}' not present")]
    InvalidHeroId(u64),
}
