//! feedgate - Signature-gated feed replication
//!
//! An access-control filter for multi-feed replication. During each pairwise
//! sync it decides which append-only feeds a node advertises and accepts,
//! admitting only feeds whose public key carries a valid Ed25519 signature
//! under one configured trust key.
//!
//! Key principles:
//! - One trust key per node, also used as the transport identity
//! - Never disclose a feed we cannot prove is trusted
//! - Never accept a feed whose signature does not verify
//! - Signatures learned from peers are durable before acceptance returns
//!
//! ```rust,ignore
//! use feedgate::gate::ReplicationGate;
//! use feedgate::host::MemoryMultifeed;
//! use feedgate::storage::MemoryStorage;
//!
//! let gate = Arc::new(ReplicationGate::new(trust_key, Arc::new(MemoryStorage::new()), Some(secret))?);
//! let mut host = MemoryMultifeed::new();
//! host.use_gate(gate).await?;
//! let feed = host.writer("local").await?; // signed on creation
//! ```

pub mod crypto;
pub mod error;
pub mod gate;
pub mod host;
pub mod keys;
pub mod storage;
pub mod store;

pub use error::{GateError, GateResult};
pub use gate::{Advertisement, ReplicationGate};
pub use keys::{FeedKey, KeyMaterial, Signature, SigningSecret, TrustKey};
