/// Cryptographic primitives for the replication gate
///
/// This module implements:
/// - Ed25519 verification as a total predicate over optional inputs
/// - Feed signing with self-verification against the trust key
/// - Deterministic signing secret derivation from a BIP-39 mnemonic (keyring)
pub mod keyring;
pub mod signer;
pub mod verify;

pub use keyring::{KeyringError, TrustKeyring};
pub use signer::{generate_secret, public_key_of, Signer};
pub use verify::{verify, verify_encoded, verify_feed};
