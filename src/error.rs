//! Crate-level error type for gate operations.

use crate::keys::{FeedKey, KeyError};
use crate::storage::StorageError;
use thiserror::Error;

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;

/// Errors surfaced by the signature store, signer and replication gate.
///
/// Verification never produces one of these; it is a plain predicate.
#[derive(Debug, Error)]
pub enum GateError {
    /// Required trust key, storage or signing secret missing or unusable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed key material at a public entry point.
    #[error("Encoding error: {0}")]
    Encoding(#[from] KeyError),

    /// A freshly produced signature did not verify under the trust key.
    /// The signing secret and the trust key are not a pair.
    #[error("Signature for feed {feed} does not verify under the trust key; check that the signing secret matches the trust key")]
    KeyMismatch { feed: FeedKey },

    /// A signature supplied for import did not verify under the trust key.
    #[error("Signature for feed {feed} does not verify under the trust key")]
    InvalidSignature { feed: FeedKey },

    /// Reading the persisted signature record failed.
    #[error("Failed to read signature store: {0}")]
    StorageRead(#[source] StorageError),

    /// Persisting the signature record failed. The in-memory map is ahead of
    /// storage until a later save succeeds.
    #[error("Failed to write signature store: {0}")]
    StorageWrite(#[source] StorageError),

    /// The persisted payload is not a valid signature record.
    #[error("Corrupt signature store: {0}")]
    Corrupt(String),
}
