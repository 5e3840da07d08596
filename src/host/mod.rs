//! Trait abstractions for the replication host.
//!
//! The gate never reaches into host state. The host exposes the two hooks
//! below and the gate drives them from [`crate::gate::ReplicationGate::initialize`].
//! Enables the in-memory host in [`memory`] for end-to-end testing.

pub mod memory;

pub use memory::{replicate, HostError, MemoryFeed, MemoryMultifeed, ReplicationSummary};

use crate::error::GateResult;
use crate::keys::{FeedKey, TrustKey};
use async_trait::async_trait;
use std::sync::Arc;

/// What the host tells listeners about a newly created feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedInfo {
    pub key: FeedKey,
    /// Whether this node holds the feed's secret key and can append to it.
    pub writable: bool,
}

/// Receives feed-creation events from the host.
#[async_trait]
pub trait FeedListener: Send + Sync {
    async fn on_feed(&self, feed: &FeedInfo, name: &str) -> GateResult<()>;
}

/// The configuration surface a replication host exposes to the gate.
pub trait ReplicationHost {
    /// Install the transport identity key. Peers only connect when their
    /// transport keys match.
    fn set_transport_key(&mut self, key: TrustKey);

    /// Register `listener` ahead of every listener already installed, so it
    /// observes new feeds first.
    fn prepend_feed_listener(&mut self, listener: Arc<dyn FeedListener>);
}
