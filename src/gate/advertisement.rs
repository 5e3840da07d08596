//! Wire payload of the outbound gating step.

use crate::keys::{FeedKey, Signature};
use serde::{Deserialize, Serialize};

/// Feeds this node is willing to disclose, with parallel signatures so the
/// peer can adopt them without holding its own copy.
///
/// Serialized as `{"keys": ["<hex>", ...], "signatures": ["<hex>", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertisement {
    pub keys: Vec<FeedKey>,
    pub signatures: Vec<Signature>,
}

impl Advertisement {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// `(key, signature)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&FeedKey, &Signature)> {
        self.keys.iter().zip(self.signatures.iter())
    }
}
