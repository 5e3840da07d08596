//! Ed25519 signature verification as a total predicate.
//!
//! Missing or malformed inputs yield `false` instead of an error so callers
//! can use verification directly as a filter.

use crate::keys::{FeedKey, KeyMaterial, Signature, TrustKey};
use ring::signature::{UnparsedPublicKey, ED25519};

/// Check `signature` over `message` under `public_key`.
///
/// Returns `false` if any argument is `None`, or if the key or signature has
/// the wrong length.
pub fn verify(message: Option<&[u8]>, signature: Option<&[u8]>, public_key: Option<&[u8]>) -> bool {
    let (Some(message), Some(signature), Some(public_key)) = (message, signature, public_key)
    else {
        return false;
    };

    UnparsedPublicKey::new(&ED25519, public_key)
        .verify(message, signature)
        .is_ok()
}

/// [`verify`] over hex text or raw bytes. Undecodable input is `false`.
pub fn verify_encoded(
    message: Option<KeyMaterial<'_>>,
    signature: Option<KeyMaterial<'_>>,
    public_key: Option<KeyMaterial<'_>>,
) -> bool {
    let decode = |material: Option<KeyMaterial<'_>>| material.and_then(|m| m.to_bytes().ok());
    let message = decode(message);
    let signature = decode(signature);
    let public_key = decode(public_key);

    verify(
        message.as_deref(),
        signature.as_deref(),
        public_key.as_deref(),
    )
}

/// Whether `signature` endorses `feed` under `trust_key`.
pub fn verify_feed(feed: &FeedKey, signature: Option<&Signature>, trust_key: &TrustKey) -> bool {
    verify(
        Some(feed.as_bytes().as_slice()),
        signature.map(|sig| sig.as_bytes().as_slice()),
        Some(trust_key.as_bytes().as_slice()),
    )
}
