//! In-memory multi-feed host for testing.
//!
//! Holds a set of append-only feeds, emits feed-creation events to its
//! listeners, and replicates with another host through the gate's have/want
//! exchange. There is no transport: [`replicate`] moves feed contents
//! directly between two hosts in the same process.

use super::{FeedInfo, FeedListener, ReplicationHost};
use crate::crypto::{generate_secret, public_key_of};
use crate::error::GateError;
use crate::gate::{Advertisement, ReplicationGate};
use crate::keys::{FeedKey, TrustKey};
use crate::store::LoadOutcome;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Errors raised by the in-memory host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Unknown feed: {0}")]
    UnknownFeed(FeedKey),

    #[error("Feed {0} is not writable on this node")]
    NotWritable(FeedKey),

    #[error("Feed {feed} has no entry at index {index}")]
    MissingEntry { feed: FeedKey, index: usize },

    /// The two hosts were configured with different transport keys and
    /// would never complete a handshake.
    #[error("Transport keys differ, peers are on different networks")]
    NetworkMismatch,

    #[error(transparent)]
    Gate(#[from] GateError),
}

/// One append-only log.
#[derive(Debug, Clone)]
pub struct MemoryFeed {
    key: FeedKey,
    writable: bool,
    entries: Vec<Vec<u8>>,
}

impl MemoryFeed {
    pub fn key(&self) -> &FeedKey {
        &self.key
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn info(&self) -> FeedInfo {
        FeedInfo {
            key: self.key,
            writable: self.writable,
        }
    }

    /// Read-only copy handed to a peer.
    fn replica(&self) -> Self {
        Self {
            key: self.key,
            writable: false,
            entries: self.entries.clone(),
        }
    }
}

/// A node holding many feeds, optionally filtered by a replication gate.
#[derive(Default)]
pub struct MemoryMultifeed {
    transport_key: Option<TrustKey>,
    listeners: Vec<Arc<dyn FeedListener>>,
    feeds: BTreeMap<FeedKey, MemoryFeed>,
    gate: Option<Arc<ReplicationGate>>,
}

impl MemoryMultifeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `gate` as this host's replication filter.
    pub async fn use_gate(&mut self, gate: Arc<ReplicationGate>) -> Result<LoadOutcome, HostError> {
        let outcome = gate.initialize(self).await?;
        self.gate = Some(gate);
        Ok(outcome)
    }

    pub fn transport_key(&self) -> Option<&TrustKey> {
        self.transport_key.as_ref()
    }

    pub fn gate(&self) -> Option<&Arc<ReplicationGate>> {
        self.gate.as_ref()
    }

    /// Create a new local writable feed and notify listeners in order.
    pub async fn writer(&mut self, name: &str) -> Result<FeedKey, HostError> {
        let secret = generate_secret()?;
        let key = FeedKey::from_bytes(*public_key_of(&secret)?.as_bytes());
        let feed = MemoryFeed {
            key,
            writable: true,
            entries: Vec::new(),
        };
        let info = feed.info();
        self.feeds.insert(key, feed);
        debug!(feed = %key, name, "created writer");

        self.emit(&info, name).await?;
        Ok(key)
    }

    /// Append an entry to a local writable feed. Returns its index.
    pub fn append(&mut self, feed: &FeedKey, data: &[u8]) -> Result<usize, HostError> {
        let target = self
            .feeds
            .get_mut(feed)
            .ok_or(HostError::UnknownFeed(*feed))?;
        if !target.writable {
            return Err(HostError::NotWritable(*feed));
        }
        target.entries.push(data.to_vec());
        Ok(target.entries.len() - 1)
    }

    /// Read entry `index` of `feed`.
    pub fn get(&self, feed: &FeedKey, index: usize) -> Result<&[u8], HostError> {
        let target = self.feeds.get(feed).ok_or(HostError::UnknownFeed(*feed))?;
        target
            .entries
            .get(index)
            .map(Vec::as_slice)
            .ok_or(HostError::MissingEntry { feed: *feed, index })
    }

    pub fn feed(&self, key: &FeedKey) -> Option<&MemoryFeed> {
        self.feeds.get(key)
    }

    /// Keys of every feed held, sorted.
    pub fn feed_keys(&self) -> Vec<FeedKey> {
        self.feeds.keys().copied().collect()
    }

    /// What this host offers a peer. Without a gate every feed is offered,
    /// unsigned.
    async fn advertise(&self) -> Advertisement {
        let keys = self.feed_keys();
        match &self.gate {
            Some(gate) => gate.have(&keys).await,
            None => Advertisement {
                keys,
                signatures: Vec::new(),
            },
        }
    }

    /// Which of a peer's offered feeds this host takes.
    async fn accept(&self, offer: &Advertisement) -> Result<Vec<FeedKey>, HostError> {
        match &self.gate {
            Some(gate) => Ok(gate.accept(offer).await?),
            None => Ok(offer.keys.clone()),
        }
    }

    /// Copy accepted feeds from `source` that this host lacks. Returns the
    /// keys that were new.
    async fn receive(
        &mut self,
        source: &MemoryMultifeed,
        accepted: &[FeedKey],
    ) -> Result<Vec<FeedKey>, HostError> {
        let mut received = Vec::new();
        for key in accepted {
            if self.feeds.contains_key(key) {
                continue;
            }
            let replica = source
                .feeds
                .get(key)
                .ok_or(HostError::UnknownFeed(*key))?
                .replica();
            let info = replica.info();
            self.feeds.insert(*key, replica);
            self.emit(&info, &key.to_hex()).await?;
            received.push(*key);
        }
        Ok(received)
    }

    async fn emit(&self, info: &FeedInfo, name: &str) -> Result<(), HostError> {
        for listener in &self.listeners {
            listener.on_feed(info, name).await?;
        }
        Ok(())
    }
}

impl ReplicationHost for MemoryMultifeed {
    fn set_transport_key(&mut self, key: TrustKey) {
        self.transport_key = Some(key);
    }

    fn prepend_feed_listener(&mut self, listener: Arc<dyn FeedListener>) {
        self.listeners.insert(0, listener);
    }
}

/// Feeds each side gained from one [`replicate`] run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationSummary {
    pub a_received: Vec<FeedKey>,
    pub b_received: Vec<FeedKey>,
}

/// Run one bidirectional exchange between `a` and `b`.
///
/// Both sides advertise first, then each filters the other's offer and
/// copies the feeds it accepted.
pub async fn replicate(
    a: &mut MemoryMultifeed,
    b: &mut MemoryMultifeed,
) -> Result<ReplicationSummary, HostError> {
    if a.transport_key != b.transport_key {
        return Err(HostError::NetworkMismatch);
    }

    let offer_a = a.advertise().await;
    let offer_b = b.advertise().await;

    let accepted_by_a = a.accept(&offer_b).await?;
    let accepted_by_b = b.accept(&offer_a).await?;

    let a_received = a.receive(b, &accepted_by_a).await?;
    let b_received = b.receive(a, &accepted_by_b).await?;

    debug!(
        a_received = a_received.len(),
        b_received = b_received.len(),
        "replication finished"
    );
    Ok(ReplicationSummary {
        a_received,
        b_received,
    })
}
