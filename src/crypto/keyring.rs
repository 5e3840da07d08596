//! Signing secret derivation from a BIP-39 mnemonic
//!
//! Writer nodes that share a trust root need the same Ed25519 secret. Rather
//! than copying raw key bytes between machines, the operator can share a
//! 24-word mnemonic and every node derives the identical key pair from it.
//!
//! ## Key Hierarchy
//!
//! ```text
//! BIP-39 Mnemonic (24 words)
//!         │
//!         ▼
//! bip39::Mnemonic::to_seed("")  → [u8; 64]
//!         │
//!         ▼
//! HKDF-SHA256(salt="feedgate-trust-v1", seed)
//!         │
//!         └─► HKDF expand("feed-signing") → Ed25519 seed
//! ```
//!
//! The trust key is the public half of the derived signing secret, so a node
//! that only holds the trust key can still verify without ever seeing the
//! mnemonic.

use super::signer::public_key_of;
use crate::keys::{SigningSecret, TrustKey, SEED_LEN};
use bip39::Mnemonic;
use hkdf::Hkdf;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroize;

/// Domain separation salt for master key derivation
const MASTER_SALT: &[u8] = b"feedgate-trust-v1";

/// HKDF info string for the feed signing key
const FEED_SIGNING: &[u8] = b"feed-signing";

/// Errors that can occur during key derivation
#[derive(Debug, Error)]
pub enum KeyringError {
    /// Invalid BIP-39 mnemonic
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    /// HKDF expansion or key pair construction failed
    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),
}

/// Signing secret and trust key derived from a mnemonic.
pub struct TrustKeyring {
    signing_seed: [u8; SEED_LEN],

    trust_key: TrustKey,
}

impl Drop for TrustKeyring {
    fn drop(&mut self) {
        self.signing_seed.zeroize();
    }
}

impl TrustKeyring {
    /// Derive the keyring from a BIP-39 mnemonic phrase.
    ///
    /// The mnemonic string is not retained; callers should zeroize their copy.
    pub fn from_mnemonic(mnemonic: &str) -> Result<Self, KeyringError> {
        let parsed =
            Mnemonic::parse(mnemonic).map_err(|e| KeyringError::InvalidMnemonic(e.to_string()))?;

        // Empty passphrase: the mnemonic alone is the shared secret
        let mut seed = parsed.to_seed("");
        let hkdf = Hkdf::<Sha256>::new(Some(MASTER_SALT), &seed);
        seed.zeroize();

        let mut signing_seed = [0u8; SEED_LEN];
        hkdf.expand(FEED_SIGNING, &mut signing_seed)
            .map_err(|e| KeyringError::DerivationFailed(format!("{:?}", e)))?;

        let trust_key = public_key_of(&SigningSecret::from_seed(signing_seed))
            .map_err(|e| KeyringError::DerivationFailed(e.to_string()))?;

        Ok(Self {
            signing_seed,
            trust_key,
        })
    }

    /// Signing secret for [`crate::gate::ReplicationGate`].
    pub fn signing_secret(&self) -> SigningSecret {
        SigningSecret::from_seed(self.signing_seed)
    }

    /// Trust key to distribute to every node, including read-only ones.
    pub fn trust_key(&self) -> TrustKey {
        self.trust_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::Signer;
    use crate::keys::FeedKey;

    // Standard BIP-39 test mnemonic (DO NOT use in production)
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon art";

    #[test]
    fn test_keyring_from_valid_mnemonic() {
        let keyring = TrustKeyring::from_mnemonic(TEST_MNEMONIC).unwrap();
        let derived = public_key_of(&keyring.signing_secret()).unwrap();
        assert_eq!(derived, keyring.trust_key(), "trust key is the secret's public half");
    }

    #[test]
    fn test_keyring_from_invalid_mnemonic() {
        let result = TrustKeyring::from_mnemonic("invalid mnemonic words");
        assert!(matches!(result, Err(KeyringError::InvalidMnemonic(_))));
    }

    #[test]
    fn test_keyring_determinism() {
        let keyring1 = TrustKeyring::from_mnemonic(TEST_MNEMONIC).unwrap();
        let keyring2 = TrustKeyring::from_mnemonic(TEST_MNEMONIC).unwrap();

        assert_eq!(keyring1.trust_key(), keyring2.trust_key());
        assert_eq!(
            keyring1.signing_secret().seed(),
            keyring2.signing_secret().seed()
        );
    }

    #[test]
    fn test_different_mnemonics_produce_different_keys() {
        let mnemonic2 = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo vote";

        let keyring1 = TrustKeyring::from_mnemonic(TEST_MNEMONIC).unwrap();
        let keyring2 = TrustKeyring::from_mnemonic(mnemonic2).unwrap();

        assert_ne!(keyring1.trust_key(), keyring2.trust_key());
    }

    #[test]
    fn test_derived_secret_signs_for_derived_trust_key() {
        let keyring = TrustKeyring::from_mnemonic(TEST_MNEMONIC).unwrap();
        let signer = Signer::new(&keyring.signing_secret(), keyring.trust_key()).unwrap();

        assert!(signer.sign(&FeedKey::from_bytes([1u8; 32])).is_ok());
    }

    #[test]
    fn test_seed_is_non_zero() {
        let keyring = TrustKeyring::from_mnemonic(TEST_MNEMONIC).unwrap();
        assert_ne!(keyring.signing_secret().seed(), &[0u8; SEED_LEN]);
    }
}
