//! In-memory storage backend.

use super::{RandomAccess, StorageError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory storage.
///
/// Clones share the same buffer, so a test can keep a handle and inspect or
/// reuse what a gate persisted.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    /// `None` until the first write
    data: Option<Vec<u8>>,
    fail_writes: bool,
    fail_reads: bool,
}

impl MemoryStorage {
    /// Create an empty, not-yet-existing region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a region holding `data` (for test setup).
    pub fn with_contents(data: Vec<u8>) -> Self {
        let storage = Self::new();
        storage.lock().data = Some(data);
        storage
    }

    /// Snapshot of the current contents.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.lock().data.clone()
    }

    /// Make every subsequent write fail (for test setup).
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Make `stat` and `read` fail with a non-"absent" error (for test setup).
    pub fn set_fail_reads(&self, fail: bool) {
        self.lock().fail_reads = fail;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned buffer is still a valid byte vector.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RandomAccess for MemoryStorage {
    async fn stat(&self) -> Result<u64, StorageError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        state
            .data
            .as_ref()
            .map(|data| data.len() as u64)
            .ok_or(StorageError::NotFound)
    }

    async fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>, StorageError> {
        let state = self.lock();
        if state.fail_reads {
            return Err(StorageError::Unavailable("reads disabled".to_string()));
        }
        let data = state.data.as_ref().ok_or(StorageError::NotFound)?;
        let size = data.len() as u64;
        let end = offset.checked_add(len).filter(|end| *end <= size).ok_or(
            StorageError::OutOfBounds { offset, len, size },
        )?;
        Ok(data[offset as usize..end as usize].to_vec())
    }

    async fn write(&self, offset: u64, bytes: &[u8]) -> Result<(), StorageError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StorageError::Unavailable("writes disabled".to_string()));
        }
        let data = state.data.get_or_insert_with(Vec::new);
        let start = offset as usize;
        let end = start + bytes.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(bytes);
        Ok(())
    }
}
