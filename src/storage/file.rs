//! File-backed storage.

use super::{RandomAccess, StorageError};
use async_trait::async_trait;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// One file on disk addressed by byte offset.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at an explicit file path. Nothing is created until the first
    /// write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage for `name` inside directory `dir`.
    pub fn open_in(dir: &Path, name: &str) -> Self {
        Self::new(dir.join(name))
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RandomAccess for FileStorage {
    async fn stat(&self) -> Result<u64, StorageError> {
        match fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn read(&self, offset: u64, len: u64) -> Result<Vec<u8>, StorageError> {
        let mut file = match fs::File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let size = file.metadata().await?.len();
        if offset.checked_add(len).map_or(true, |end| end > size) {
            return Err(StorageError::OutOfBounds { offset, len, size });
        }

        let len = usize::try_from(len).map_err(|_| StorageError::OutOfBounds {
            offset,
            len,
            size,
        })?;
        let mut buf = vec![0u8; len];
        file.seek(SeekFrom::Start(offset)).await?;
        file.read_exact(&mut buf).await?;
        Ok(buf)
    }

    async fn write(&self, offset: u64, data: &[u8]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.path)
            .await?;
        file.seek(SeekFrom::Start(offset)).await?;
        file.write_all(data).await?;
        file.sync_data().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open_in(dir.path(), "signatures.json");

        assert!(matches!(storage.stat().await, Err(StorageError::NotFound)));
        assert!(matches!(
            storage.read(0, 4).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_empty_file_has_zero_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signatures.json");
        std::fs::write(&path, b"").unwrap();

        let storage = FileStorage::new(&path);
        assert_eq!(storage.stat().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_read_at_offsets() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open_in(&dir.path().join("nested"), "signatures.json");

        storage.write(0, &[1, 2, 3, 4]).await.unwrap();
        storage.write(4, b"{}").await.unwrap();

        assert_eq!(storage.stat().await.unwrap(), 6);
        assert_eq!(storage.read(4, 2).await.unwrap(), b"{}".to_vec());
        assert_eq!(storage.read(0, 4).await.unwrap(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_short_read_is_out_of_bounds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("signatures.json");
        std::fs::write(&path, [1u8, 2]).unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.read(0, 4).await,
            Err(StorageError::OutOfBounds { size: 2, .. })
        ));
    }
}
