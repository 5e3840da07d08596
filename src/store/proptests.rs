//! Property-based tests for the signature record
//!
//! Tests for:
//! - Payload codec: arbitrary maps survive encode/decode unchanged
//! - Framing: a persisted map reloads byte-identical through storage
//! - Growth: later, larger writes never leave a stale record behind

use super::{decode_payload, encode_payload, LoadOutcome, SignatureStore, HEADER_LEN};
use crate::keys::{FeedKey, Signature};
use crate::storage::MemoryStorage;
use proptest::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;

fn signature_map() -> impl Strategy<Value = BTreeMap<FeedKey, Signature>> {
    prop::collection::btree_map(
        any::<[u8; 32]>().prop_map(FeedKey::from_bytes),
        prop::collection::vec(any::<u8>(), 64).prop_map(|bytes| {
            let mut sig = [0u8; 64];
            sig.copy_from_slice(&bytes);
            Signature::from_bytes(sig)
        }),
        0..16,
    )
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    /// Property: payload codec is lossless
    #[test]
    fn payload_roundtrip_preserves_map(map in signature_map()) {
        let payload = encode_payload(&map).unwrap();
        let decoded = decode_payload(&payload).unwrap();
        prop_assert_eq!(decoded, map);
    }

    /// Property: load(persist(M)) == M
    #[test]
    fn persisted_map_reloads_exactly(map in signature_map()) {
        let storage = MemoryStorage::new();

        let reloaded = block_on(async {
            let mut store = SignatureStore::new(Arc::new(storage.clone()));
            for (feed, sig) in &map {
                store.insert(*feed, *sig);
            }
            store.persist().await.unwrap();

            let mut fresh = SignatureStore::new(Arc::new(storage.clone()));
            let outcome = fresh.load().await.unwrap();
            let entries: BTreeMap<FeedKey, Signature> =
                fresh.iter().map(|(f, s)| (*f, *s)).collect();
            (outcome, entries)
        });

        prop_assert_eq!(reloaded.0, LoadOutcome::Loaded(map.len()));
        prop_assert_eq!(reloaded.1, map);
    }

    /// Property: the header always describes exactly the payload that follows
    #[test]
    fn header_matches_payload_length(map in signature_map()) {
        let storage = MemoryStorage::new();
        block_on(async {
            let mut store = SignatureStore::new(Arc::new(storage.clone()));
            for (feed, sig) in &map {
                store.insert(*feed, *sig);
            }
            store.persist().await.unwrap();
        });

        let bytes = storage.contents().unwrap();
        let mut header = [0u8; 4];
        header.copy_from_slice(&bytes[..HEADER_LEN as usize]);
        let len = u32::from_le_bytes(header) as usize;
        prop_assert_eq!(bytes.len(), HEADER_LEN as usize + len);
    }

    /// Property: successive persists of a growing map reload the latest one
    #[test]
    fn growing_map_reloads_latest(first in signature_map(), second in signature_map()) {
        let storage = MemoryStorage::new();

        let (expected, reloaded) = block_on(async {
            let mut store = SignatureStore::new(Arc::new(storage.clone()));
            for (feed, sig) in &first {
                store.insert(*feed, *sig);
            }
            store.persist().await.unwrap();
            for (feed, sig) in &second {
                store.insert(*feed, *sig);
            }
            store.persist().await.unwrap();
            let expected: BTreeMap<FeedKey, Signature> =
                store.iter().map(|(f, s)| (*f, *s)).collect();

            let mut fresh = SignatureStore::new(Arc::new(storage.clone()));
            fresh.load().await.unwrap();
            let reloaded: BTreeMap<FeedKey, Signature> =
                fresh.iter().map(|(f, s)| (*f, *s)).collect();
            (expected, reloaded)
        });

        prop_assert_eq!(reloaded, expected);
    }
}
