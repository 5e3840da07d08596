//! Byte-addressable storage for the persisted signature record.
//!
//! The signature store only needs offset reads and writes plus a stat-like
//! size query that can tell "does not exist" apart from real failures.
//! Backends:
//! - **Memory**: shared in-process buffer for tests and ephemeral nodes
//! - **File**: a single file on disk via `tokio::fs`

pub mod file;
pub mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    /// The region has never been written.
    #[error("Storage region does not exist")]
    NotFound,

    #[error("Read out of bounds: offset={offset}, len={len}, size={size}")]
    OutOfBounds { offset: u64, len: u64, size: u64 },

    /// Injected or backend-specific failure.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Random-access byte storage.
///
/// Mirrors the small surface the gate needs from its host's storage layer,
/// which keeps the backend swappable between tests and production.
#[async_trait]
pub trait RandomAccess: Send + Sync {
    /// Current size in bytes.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` if the region does not exist yet.
    async fn stat(&self) -> Result<u64, StorageError>;

    /// Read exactly `len` bytes starting at `offset`.
    async fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>, StorageError>;

    /// Write `data` at `offset`, creating or extending the region as needed.
    async fn write(&self, offset: u64, data: &[u8]) -> Result<(), StorageError>;
}
