//! Replication gate: trust-key filtering for feed exchange.
//!
//! Plugs into a host's set-reconciliation handshake at two points:
//!
//! - **have**: which local feeds this node discloses to a peer. Only feeds
//!   whose stored signature verifies under the trust key are offered, each
//!   with its signature attached.
//! - **want**: which of a peer's offered feeds this node accepts. A key is
//!   accepted if the local signature, or failing that the peer's, verifies.
//!   Newly learned signatures are persisted before the accepted list is
//!   returned.
//!
//! Each side enforces the policy independently: a peer offering unsigned or
//! wrongly signed keys cannot force acceptance, and a node never discloses a
//! feed it cannot prove is trusted.
//!
//! ## Serialization
//!
//! The signature store sits behind an async mutex held for a whole
//! have/want/sign cycle, persistence included. Concurrent cycles on one gate
//! therefore cannot drop each other's entries from the persisted record.

mod advertisement;

pub use advertisement::Advertisement;

use crate::crypto::{verify_feed, Signer};
use crate::error::{GateError, GateResult};
use crate::host::{FeedInfo, FeedListener, ReplicationHost};
use crate::keys::{FeedKey, KeyMaterial, Signature, SigningSecret, TrustKey};
use crate::storage::RandomAccess;
use crate::store::{LoadOutcome, SignatureStore};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Access-control filter for one replicating node.
pub struct ReplicationGate {
    trust_key: TrustKey,
    signer: Option<Signer>,
    store: Mutex<SignatureStore>,
}

impl ReplicationGate {
    /// Create a gate checking signatures against `trust_key`.
    ///
    /// With a `secret`, locally created writable feeds are signed
    /// automatically. Without one they stay local: usable, never exchanged.
    pub fn new(
        trust_key: TrustKey,
        storage: Arc<dyn RandomAccess>,
        secret: Option<SigningSecret>,
    ) -> GateResult<Self> {
        let signer = secret
            .map(|secret| Signer::new(&secret, trust_key))
            .transpose()?;

        Ok(Self {
            trust_key,
            signer,
            store: Mutex::new(SignatureStore::new(storage)),
        })
    }

    /// Create a gate from loosely typed configuration.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the trust key or storage is missing
    /// - `Encoding` if the trust key or secret cannot be decoded
    pub fn from_encoded(
        trust_key: Option<KeyMaterial<'_>>,
        storage: Option<Arc<dyn RandomAccess>>,
        secret: Option<KeyMaterial<'_>>,
    ) -> GateResult<Self> {
        let trust_key = trust_key.ok_or_else(|| {
            GateError::Configuration("Signature checking key is required".to_string())
        })?;
        let storage =
            storage.ok_or_else(|| GateError::Configuration("Storage is required".to_string()))?;

        let trust_key = TrustKey::decode(trust_key)?;
        let secret = secret.map(SigningSecret::decode).transpose()?;
        Self::new(trust_key, storage, secret)
    }

    /// The key all feed signatures are checked against.
    pub fn trust_key(&self) -> &TrustKey {
        &self.trust_key
    }

    /// The transport identity key the host must use. Binding it to the trust
    /// key means nodes only peer within one trust root.
    pub fn transport_key(&self) -> TrustKey {
        self.trust_key
    }

    /// Whether this node can sign its own feeds.
    pub fn can_sign(&self) -> bool {
        self.signer.is_some()
    }

    /// Wire the gate into `host` and load persisted signatures.
    ///
    /// Installs the transport key, registers the gate as the first feed
    /// listener, then loads the signature store.
    pub async fn initialize<H>(self: &Arc<Self>, host: &mut H) -> GateResult<LoadOutcome>
    where
        H: ReplicationHost + ?Sized,
    {
        host.set_transport_key(self.transport_key());
        host.prepend_feed_listener(Arc::clone(self) as Arc<dyn FeedListener>);
        self.load().await
    }

    /// Reload the signature store from storage.
    pub async fn load(&self) -> GateResult<LoadOutcome> {
        self.store.lock().await.load().await
    }

    /// Lifecycle hook for a newly created feed.
    ///
    /// Signs and persists writable feeds when a signing secret is
    /// configured. Returns the new signature, or `None` if nothing was signed.
    pub async fn on_feed_created(
        &self,
        feed: &FeedInfo,
        name: &str,
    ) -> GateResult<Option<Signature>> {
        if !feed.writable {
            debug!(feed = %feed.key, name, "read-only feed, not signing");
            return Ok(None);
        }
        self.sign_feed(&feed.key).await
    }

    /// Sign `feed` with the local secret and persist the signature.
    ///
    /// Returns `None` when no signing secret is configured.
    ///
    /// # Errors
    ///
    /// `KeyMismatch` if the secret does not belong to the trust key; the
    /// store is left untouched.
    pub async fn sign_feed(&self, feed: &FeedKey) -> GateResult<Option<Signature>> {
        let Some(signer) = &self.signer else {
            debug!(feed = %feed, "no signing secret, feed will not be exchanged");
            return Ok(None);
        };

        let signature = signer.sign(feed)?;
        self.store.lock().await.set(*feed, signature).await?;
        info!(feed = %feed, "signed new writer");
        Ok(Some(signature))
    }

    /// Record a signature obtained out of band.
    ///
    /// # Errors
    ///
    /// `InvalidSignature` if it does not verify under the trust key.
    pub async fn import_signature(&self, feed: FeedKey, signature: Signature) -> GateResult<()> {
        if !verify_feed(&feed, Some(&signature), &self.trust_key) {
            return Err(GateError::InvalidSignature { feed });
        }
        self.store.lock().await.set(feed, signature).await
    }

    /// Outbound gating step: filter `local` to feeds whose stored signature
    /// verifies, paired with those signatures.
    pub async fn have(&self, local: &[FeedKey]) -> Advertisement {
        let store = self.store.lock().await;
        let mut seen = BTreeSet::new();
        let mut advertisement = Advertisement::default();

        for feed in local {
            if !seen.insert(*feed) {
                continue;
            }
            let Some(signature) = store.get(feed) else {
                continue;
            };
            if verify_feed(feed, Some(signature), &self.trust_key) {
                advertisement.keys.push(*feed);
                advertisement.signatures.push(*signature);
            }
        }

        debug!(
            offered = local.len(),
            disclosed = advertisement.len(),
            "filtered local feeds"
        );
        advertisement
    }

    /// Inbound gating step: accept the peer's offered keys that verify,
    /// using the local signature when one exists and the peer's parallel
    /// signature otherwise.
    ///
    /// Each key is judged on its own. Newly learned signatures are persisted
    /// in one write before returning; if nothing new was learned, storage is
    /// not touched.
    ///
    /// # Errors
    ///
    /// `StorageWrite` if persisting newly learned signatures fails. They stay
    /// in memory; [`ReplicationGate::flush`] retries the save.
    pub async fn want(
        &self,
        remote_keys: &[FeedKey],
        remote_signatures: &[Signature],
    ) -> GateResult<Vec<FeedKey>> {
        let mut store = self.store.lock().await;
        let mut accepted = Vec::new();
        let mut seen = BTreeSet::new();
        let mut discovered = 0usize;

        for (i, feed) in remote_keys.iter().enumerate() {
            if !seen.insert(*feed) {
                continue;
            }
            let local = store.get(feed).copied();
            let candidate = local.or_else(|| remote_signatures.get(i).copied());

            if !verify_feed(feed, candidate.as_ref(), &self.trust_key) {
                debug!(feed = %feed, "rejecting unverified feed");
                continue;
            }
            if local.is_none() {
                if let Some(signature) = candidate {
                    store.insert(*feed, signature);
                    discovered += 1;
                }
            }
            accepted.push(*feed);
        }

        if discovered > 0 {
            store.persist().await?;
            info!(discovered, "learned signatures from peer");
        }

        debug!(
            offered = remote_keys.len(),
            accepted = accepted.len(),
            "filtered remote feeds"
        );
        Ok(accepted)
    }

    /// [`ReplicationGate::want`] over a peer's [`Advertisement`].
    pub async fn accept(&self, offer: &Advertisement) -> GateResult<Vec<FeedKey>> {
        self.want(&offer.keys, &offer.signatures).await
    }

    /// Persist the store if it is ahead of storage. Returns whether a write
    /// happened.
    pub async fn flush(&self) -> GateResult<bool> {
        let mut store = self.store.lock().await;
        if !store.is_dirty() {
            return Ok(false);
        }
        store.persist().await?;
        Ok(true)
    }

    /// Stored signature for `feed`.
    pub async fn signature(&self, feed: &FeedKey) -> Option<Signature> {
        self.store.lock().await.get(feed).copied()
    }

    /// Number of stored signatures.
    pub async fn signature_count(&self) -> usize {
        self.store.lock().await.len()
    }

    /// Snapshot of every stored `(feed, signature)` pair in key order.
    pub async fn signatures(&self) -> Vec<(FeedKey, Signature)> {
        self.store
            .lock()
            .await
            .iter()
            .map(|(feed, sig)| (*feed, *sig))
            .collect()
    }
}

#[async_trait]
impl FeedListener for ReplicationGate {
    async fn on_feed(&self, feed: &FeedInfo, name: &str) -> GateResult<()> {
        self.on_feed_created(feed, name).await.map(|_| ())
    }
}
