//! Feed signing with self-verification.
//!
//! Every signature is checked against the trust key before it is handed
//! back. A secret that does not belong to the trust key therefore fails
//! loudly at the first signing attempt instead of producing signatures no
//! peer will ever accept.

use super::verify::verify_feed;
use crate::error::{GateError, GateResult};
use crate::keys::{FeedKey, KeyMaterial, Signature, SigningSecret, TrustKey, SEED_LEN};
use ring::rand::{SecureRandom, SystemRandom};
use ring::signature::{Ed25519KeyPair, KeyPair};
use std::fmt;
use tracing::{debug, warn};

/// Signs feed keys with the local signing secret.
pub struct Signer {
    key_pair: Ed25519KeyPair,
    trust_key: TrustKey,
}

impl Signer {
    /// Build a signer whose output is checked against `trust_key`.
    ///
    /// A 64-byte secret whose public half disagrees with its seed is rejected
    /// here. A secret that is internally consistent but belongs to a different
    /// key pair is only caught by [`Signer::sign`].
    pub fn new(secret: &SigningSecret, trust_key: TrustKey) -> GateResult<Self> {
        let key_pair = match secret.embedded_public_key() {
            Some(public) => Ed25519KeyPair::from_seed_and_public_key(secret.seed(), public),
            None => Ed25519KeyPair::from_seed_unchecked(secret.seed()),
        }
        .map_err(|e| GateError::Configuration(format!("Unusable signing secret: {}", e)))?;

        Ok(Self {
            key_pair,
            trust_key,
        })
    }

    /// Public key matching the signing secret.
    pub fn public_key(&self) -> TrustKey {
        public_key_of_pair(&self.key_pair)
    }

    /// The key signatures are checked against.
    pub fn trust_key(&self) -> &TrustKey {
        &self.trust_key
    }

    /// Sign `feed` and self-verify the result under the trust key.
    ///
    /// # Errors
    ///
    /// `KeyMismatch` if the signature does not verify. The signature is
    /// dropped.
    pub fn sign(&self, feed: &FeedKey) -> GateResult<Signature> {
        let raw = self.key_pair.sign(feed.as_bytes());
        let signature = Signature::decode(KeyMaterial::Bytes(raw.as_ref()))?;

        if !verify_feed(feed, Some(&signature), &self.trust_key) {
            warn!(
                feed = %feed,
                trust_key = %self.trust_key,
                "produced signature does not verify; is the key pair correct?"
            );
            return Err(GateError::KeyMismatch { feed: *feed });
        }

        debug!(feed = %feed, signature = %signature, "signed feed key");
        Ok(signature)
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("public_key", &self.public_key())
            .field("trust_key", &self.trust_key)
            .finish_non_exhaustive()
    }
}

/// Generate a fresh random signing secret.
pub fn generate_secret() -> GateResult<SigningSecret> {
    let mut seed = [0u8; SEED_LEN];
    SystemRandom::new()
        .fill(&mut seed)
        .map_err(|_| GateError::Configuration("System random source unavailable".to_string()))?;
    Ok(SigningSecret::from_seed(seed))
}

/// Public key belonging to `secret`.
pub fn public_key_of(secret: &SigningSecret) -> GateResult<TrustKey> {
    let key_pair = Ed25519KeyPair::from_seed_unchecked(secret.seed())
        .map_err(|e| GateError::Configuration(format!("Unusable signing secret: {}", e)))?;
    Ok(public_key_of_pair(&key_pair))
}

fn public_key_of_pair(key_pair: &Ed25519KeyPair) -> TrustKey {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(key_pair.public_key().as_ref());
    TrustKey::from_bytes(bytes)
}
