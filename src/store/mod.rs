//! Persisted signature store.
//!
//! Holds the mapping from feed key to its signature and mirrors it into a
//! [`RandomAccess`] region.
//!
//! ## Record Layout
//!
//! ```text
//! [0, 4)      u32 little-endian L = payload length
//! [4, 4 + L)  UTF-8 JSON object { "<feed key hex>": "<signature hex>", ... }
//! ```
//!
//! The header is always written before the payload, and readers read the
//! header first, then exactly `L` payload bytes. Bytes past `4 + L` are
//! ignored; the record only grows, so they never hold live data.

use crate::error::{GateError, GateResult};
use crate::keys::{FeedKey, Signature};
use crate::storage::{RandomAccess, StorageError};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[cfg(test)]
mod proptests;

/// Name of the signature record inside a storage directory.
pub const SIGNATURES_FILE: &str = "signatures.json";

/// Length of the little-endian payload length header.
pub const HEADER_LEN: u64 = 4;

/// Outcome of [`SignatureStore::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A record was read; carries the number of signatures.
    Loaded(usize),
    /// Nothing persisted yet (absent, zero length, or header not yet written).
    Empty,
}

/// In-memory signature map plus its durable copy.
pub struct SignatureStore {
    storage: Arc<dyn RandomAccess>,
    signatures: BTreeMap<FeedKey, Signature>,
    /// Set when the map holds entries that have not been persisted yet.
    dirty: bool,
}

impl SignatureStore {
    /// Create an empty store over `storage`. Call [`SignatureStore::load`] to
    /// pick up anything already persisted.
    pub fn new(storage: Arc<dyn RandomAccess>) -> Self {
        Self {
            storage,
            signatures: BTreeMap::new(),
            dirty: false,
        }
    }

    /// Replace the in-memory map with the persisted record.
    ///
    /// A missing or empty region, or one too short to hold the header, loads
    /// as empty: a peer that is still initializing may legitimately have
    /// nothing written yet.
    ///
    /// # Errors
    ///
    /// - `StorageRead` for any other stat failure, or a failed payload read
    /// - `Corrupt` if the payload is not a valid record
    pub async fn load(&mut self) -> GateResult<LoadOutcome> {
        match self.storage.stat().await {
            Ok(0) | Err(StorageError::NotFound) => {
                debug!("no persisted signatures");
                return Ok(self.reset());
            }
            Ok(_) => {}
            Err(e) => return Err(GateError::StorageRead(e)),
        }

        let header = match self.storage.read(0, HEADER_LEN).await {
            Ok(header) => header,
            Err(e) => {
                debug!(error = %e, "loading signatures failed, normal for a fresh store");
                return Ok(self.reset());
            }
        };
        let Some(len) = decode_header(&header) else {
            debug!("signature header truncated");
            return Ok(self.reset());
        };
        if len == 0 {
            return Ok(self.reset());
        }

        let payload = self
            .storage
            .read(HEADER_LEN, u64::from(len))
            .await
            .map_err(GateError::StorageRead)?;

        self.signatures = decode_payload(&payload)?;
        self.dirty = false;
        info!(count = self.signatures.len(), "signatures reloaded");
        Ok(LoadOutcome::Loaded(self.signatures.len()))
    }

    /// Signature recorded for `feed`.
    pub fn get(&self, feed: &FeedKey) -> Option<&Signature> {
        self.signatures.get(feed)
    }

    pub fn contains(&self, feed: &FeedKey) -> bool {
        self.signatures.contains_key(feed)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Entries in feed key order.
    pub fn iter(&self) -> impl Iterator<Item = (&FeedKey, &Signature)> {
        self.signatures.iter()
    }

    /// Whether the map is ahead of storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Record a signature without persisting it.
    ///
    /// Returns `true` if the map changed. Batches call this per key and then
    /// [`SignatureStore::persist`] once.
    pub fn insert(&mut self, feed: FeedKey, signature: Signature) -> bool {
        let changed = self.signatures.insert(feed, signature) != Some(signature);
        self.dirty |= changed;
        changed
    }

    /// Record a signature and persist the whole map before returning.
    pub async fn set(&mut self, feed: FeedKey, signature: Signature) -> GateResult<()> {
        self.insert(feed, signature);
        self.persist().await
    }

    /// Write the full map: header at offset 0, then the payload.
    ///
    /// # Errors
    ///
    /// `StorageWrite` if either write fails. The store stays dirty so a later
    /// call can retry.
    pub async fn persist(&mut self) -> GateResult<()> {
        let payload = encode_payload(&self.signatures)?;
        let header = encode_header(&payload)?;

        self.storage
            .write(0, &header)
            .await
            .map_err(GateError::StorageWrite)?;
        self.storage
            .write(HEADER_LEN, &payload)
            .await
            .map_err(GateError::StorageWrite)?;

        self.dirty = false;
        debug!(count = self.signatures.len(), bytes = payload.len(), "signatures saved");
        Ok(())
    }

    fn reset(&mut self) -> LoadOutcome {
        self.signatures.clear();
        self.dirty = false;
        LoadOutcome::Empty
    }
}

/// Serialize the map as a JSON object of lowercase hex strings.
pub fn encode_payload(signatures: &BTreeMap<FeedKey, Signature>) -> GateResult<Vec<u8>> {
    let record: BTreeMap<String, String> = signatures
        .iter()
        .map(|(feed, sig)| (feed.to_hex(), sig.to_hex()))
        .collect();
    serde_json::to_vec(&record).map_err(|e| GateError::Corrupt(e.to_string()))
}

/// Parse a JSON payload back into a signature map.
///
/// Keys and values are normalized through hex decoding, so upper-case hex
/// written by another implementation loads as the same entry. Entries that
/// are not a feed key and signature in hex are skipped with a warning; only
/// a payload that is not a JSON object of strings is `Corrupt`.
pub fn decode_payload(payload: &[u8]) -> GateResult<BTreeMap<FeedKey, Signature>> {
    let record: BTreeMap<String, String> =
        serde_json::from_slice(payload).map_err(|e| GateError::Corrupt(e.to_string()))?;

    let mut signatures = BTreeMap::new();
    for (feed, sig) in &record {
        let feed_key = match FeedKey::decode(feed.as_str()) {
            Ok(key) => key,
            Err(e) => {
                warn!(entry = %feed, error = %e, "skipping record entry with bad feed key");
                continue;
            }
        };
        match Signature::decode(sig.as_str()) {
            Ok(signature) => {
                signatures.insert(feed_key, signature);
            }
            Err(e) => {
                warn!(feed = %feed_key, error = %e, "skipping record entry with bad signature");
            }
        }
    }
    Ok(signatures)
}

/// Little-endian length header for `payload`.
pub fn encode_header(payload: &[u8]) -> GateResult<[u8; HEADER_LEN as usize]> {
    let len = u32::try_from(payload.len())
        .map_err(|_| GateError::Corrupt(format!("record too large: {} bytes", payload.len())))?;
    Ok(len.to_le_bytes())
}

fn decode_header(header: &[u8]) -> Option<u32> {
    let bytes: [u8; HEADER_LEN as usize] = header.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn feed(n: u8) -> FeedKey {
        FeedKey::from_bytes([n; 32])
    }

    fn sig(n: u8) -> Signature {
        Signature::from_bytes([n; 64])
    }

    fn store_over(storage: &MemoryStorage) -> SignatureStore {
        SignatureStore::new(Arc::new(storage.clone()))
    }

    #[tokio::test]
    async fn test_set_then_reload() {
        let storage = MemoryStorage::new();
        let mut store = store_over(&storage);
        store.set(feed(1), sig(2)).await.unwrap();
        assert_eq!(store.get(&feed(1)), Some(&sig(2)), "visible after set");

        // Fresh instance simulates loss of the in-memory map
        let mut reloaded = store_over(&storage);
        assert_eq!(reloaded.load().await.unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(reloaded.get(&feed(1)), Some(&sig(2)));
    }

    #[tokio::test]
    async fn test_layout_is_length_prefixed_json() {
        let storage = MemoryStorage::new();
        let mut store = store_over(&storage);
        store.set(feed(0xab), sig(0xcd)).await.unwrap();

        let bytes = storage.contents().unwrap();
        let len = u32::from_le_bytes(bytes[..4].try_into().unwrap()) as usize;
        assert_eq!(bytes.len(), 4 + len);

        let json: serde_json::Value = serde_json::from_slice(&bytes[4..]).unwrap();
        assert_eq!(json["ab".repeat(32)], serde_json::json!("cd".repeat(64)));
    }

    #[tokio::test]
    async fn test_missing_region_loads_empty() {
        let mut store = store_over(&MemoryStorage::new());
        assert_eq!(store.load().await.unwrap(), LoadOutcome::Empty);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_zero_length_region_loads_empty() {
        let mut store = store_over(&MemoryStorage::with_contents(Vec::new()));
        assert_eq!(store.load().await.unwrap(), LoadOutcome::Empty);
    }

    #[tokio::test]
    async fn test_truncated_header_loads_empty() {
        let mut store = store_over(&MemoryStorage::with_contents(vec![7, 0]));
        assert_eq!(store.load().await.unwrap(), LoadOutcome::Empty);
    }

    #[tokio::test]
    async fn test_short_payload_is_read_error() {
        let mut bytes = 100u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"{}");
        let mut store = store_over(&MemoryStorage::with_contents(bytes));

        assert!(matches!(
            store.load().await,
            Err(GateError::StorageRead(StorageError::OutOfBounds { .. }))
        ));
    }

    #[tokio::test]
    async fn test_stat_failure_is_read_error() {
        let storage = MemoryStorage::with_contents(vec![0; 8]);
        storage.set_fail_reads(true);
        let mut store = store_over(&storage);

        assert!(matches!(
            store.load().await,
            Err(GateError::StorageRead(StorageError::Unavailable(_)))
        ));
    }

    fn framed(payload: &[u8]) -> MemoryStorage {
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(payload);
        MemoryStorage::with_contents(bytes)
    }

    #[tokio::test]
    async fn test_non_object_payload_is_corrupt() {
        let mut store = store_over(&framed(b"nope!"));
        assert!(matches!(store.load().await, Err(GateError::Corrupt(_))));

        let mut store = store_over(&framed(br#"["ab","cd"]"#));
        assert!(matches!(store.load().await, Err(GateError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_foreign_entries_are_skipped() {
        let mut store = store_over(&framed(br#"{"foo":"bar"}"#));
        assert_eq!(store.load().await.unwrap(), LoadOutcome::Loaded(0));
        assert!(store.is_empty());

        // The store stays usable after skipping
        store.set(feed(1), sig(1)).await.unwrap();
        assert_eq!(store.get(&feed(1)), Some(&sig(1)));
    }

    #[tokio::test]
    async fn test_valid_entries_survive_bad_neighbours() {
        let payload = format!(
            r#"{{"foo":"bar","{}":"{}","{}":"abcd"}}"#,
            feed(2).to_hex(),
            sig(2).to_hex(),
            feed(3).to_hex(),
        );
        let mut store = store_over(&framed(payload.as_bytes()));

        assert_eq!(store.load().await.unwrap(), LoadOutcome::Loaded(1));
        assert_eq!(store.get(&feed(2)), Some(&sig(2)));
        assert!(!store.contains(&feed(3)));
    }

    #[tokio::test]
    async fn test_upper_case_hex_is_normalized() {
        let payload = format!(
            r#"{{"{}":"{}"}}"#,
            "AB".repeat(32),
            "CD".repeat(64)
        );
        let mut bytes = (payload.len() as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(payload.as_bytes());
        let mut store = store_over(&MemoryStorage::with_contents(bytes));

        store.load().await.unwrap();
        assert_eq!(store.get(&feed(0xab)), Some(&sig(0xcd)));
    }

    #[tokio::test]
    async fn test_failed_persist_stays_dirty_until_retry() {
        let storage = MemoryStorage::new();
        let mut store = store_over(&storage);
        storage.set_fail_writes(true);

        let result = store.set(feed(1), sig(1)).await;
        assert!(matches!(result, Err(GateError::StorageWrite(_))));
        assert!(store.is_dirty());
        assert_eq!(store.get(&feed(1)), Some(&sig(1)));

        storage.set_fail_writes(false);
        store.persist().await.unwrap();
        assert!(!store.is_dirty());

        let mut reloaded = store_over(&storage);
        assert_eq!(reloaded.load().await.unwrap(), LoadOutcome::Loaded(1));
    }

    #[tokio::test]
    async fn test_insert_reports_changes() {
        let mut store = store_over(&MemoryStorage::new());
        assert!(store.insert(feed(1), sig(1)));
        assert!(!store.insert(feed(1), sig(1)));
        assert!(store.insert(feed(1), sig(2)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_load_replaces_unsaved_entries() {
        let storage = MemoryStorage::new();
        let mut store = store_over(&storage);
        store.set(feed(1), sig(1)).await.unwrap();
        store.insert(feed(2), sig(2));

        store.load().await.unwrap();
        assert!(store.contains(&feed(1)));
        assert!(!store.contains(&feed(2)));
        assert!(!store.is_dirty());
    }
}
