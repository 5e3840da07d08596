//! Key material handled by the replication gate.
//!
//! Keys and signatures arrive either as hex text (config files, wire payloads,
//! the persisted signature record) or as raw bytes (feeds created by the host).
//! [`KeyMaterial`] is the one place where both forms are normalized; every
//! public constructor goes through it and ends up with a fixed-length type.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Ed25519 public key length.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Ed25519 signature length.
pub const SIGNATURE_LEN: usize = 64;

/// Ed25519 seed length.
pub const SEED_LEN: usize = 32;

/// Length of a `seed || public key` secret key.
pub const SECRET_KEY_LEN: usize = SEED_LEN + PUBLIC_KEY_LEN;

/// Errors raised while normalizing key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("Key material is missing")]
    Missing,

    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Key material as presented at a public boundary.
#[derive(Debug, Clone, Copy)]
pub enum KeyMaterial<'a> {
    /// Hex text, either case.
    Hex(&'a str),
    /// Raw bytes.
    Bytes(&'a [u8]),
}

impl<'a> KeyMaterial<'a> {
    /// Decode into raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, KeyError> {
        match self {
            Self::Hex(text) => {
                hex::decode(text.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))
            }
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }

    /// Decode into a fixed-length array.
    pub fn to_array<const N: usize>(&self) -> Result<[u8; N], KeyError> {
        let bytes = self.to_bytes()?;
        <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| KeyError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        })
    }
}

impl<'a> From<&'a str> for KeyMaterial<'a> {
    fn from(text: &'a str) -> Self {
        Self::Hex(text)
    }
}

impl<'a> From<&'a String> for KeyMaterial<'a> {
    fn from(text: &'a String) -> Self {
        Self::Hex(text.as_str())
    }
}

impl<'a> From<&'a [u8]> for KeyMaterial<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for KeyMaterial<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for KeyMaterial<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        Self::Bytes(bytes.as_slice())
    }
}

/// Fixed-length public value, rendered as lowercase hex everywhere it leaves
/// the process.
macro_rules! public_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Wrap raw bytes.
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Normalize hex text or raw bytes.
            pub fn decode<'a>(material: impl Into<KeyMaterial<'a>>) -> Result<Self, KeyError> {
                material.into().to_array::<$len>().map(Self)
            }

            /// Raw bytes.
            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Lowercase hex.
            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl TryFrom<&[u8]> for $name {
            type Error = KeyError;

            fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
                Self::decode(bytes)
            }
        }

        impl std::str::FromStr for $name {
            type Err = KeyError;

            fn from_str(text: &str) -> Result<Self, Self::Err> {
                Self::decode(text)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Self::decode(text.as_str()).map_err(serde::de::Error::custom)
            }
        }
    };
}

public_bytes!(
    /// The public key every feed signature is checked against.
    ///
    /// Doubles as the host's transport identity key, so peering and feed
    /// trust share one root.
    TrustKey,
    PUBLIC_KEY_LEN
);

public_bytes!(
    /// Public key identifying one append-only feed. Also the signed message.
    FeedKey,
    PUBLIC_KEY_LEN
);

public_bytes!(
    /// Ed25519 signature over a [`FeedKey`].
    Signature,
    SIGNATURE_LEN
);

/// Private key that lets this node mint signatures recognized under the
/// trust key.
///
/// Accepts a bare 32-byte seed or a 64-byte `seed || public key` secret key.
/// The embedded public half, when present, is checked against the seed when
/// a signer is built from it.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SigningSecret {
    seed: [u8; SEED_LEN],
    embedded_public_key: Option<[u8; PUBLIC_KEY_LEN]>,
}

impl SigningSecret {
    /// Build from a 32-byte seed.
    pub fn from_seed(seed: [u8; SEED_LEN]) -> Self {
        Self {
            seed,
            embedded_public_key: None,
        }
    }

    /// Normalize hex text or raw bytes (32-byte seed or 64-byte secret key).
    pub fn decode<'a>(material: impl Into<KeyMaterial<'a>>) -> Result<Self, KeyError> {
        let mut bytes = material.into().to_bytes()?;
        let secret = match bytes.len() {
            SEED_LEN => {
                let mut seed = [0u8; SEED_LEN];
                seed.copy_from_slice(&bytes);
                Ok(Self::from_seed(seed))
            }
            SECRET_KEY_LEN => {
                let mut seed = [0u8; SEED_LEN];
                let mut public = [0u8; PUBLIC_KEY_LEN];
                seed.copy_from_slice(&bytes[..SEED_LEN]);
                public.copy_from_slice(&bytes[SEED_LEN..]);
                Ok(Self {
                    seed,
                    embedded_public_key: Some(public),
                })
            }
            actual => Err(KeyError::InvalidLength {
                expected: SECRET_KEY_LEN,
                actual,
            }),
        };
        bytes.zeroize();
        secret
    }

    /// The 32-byte seed.
    pub fn seed(&self) -> &[u8; SEED_LEN] {
        &self.seed
    }

    /// Public half carried by a 64-byte secret key, if one was supplied.
    pub fn embedded_public_key(&self) -> Option<&[u8; PUBLIC_KEY_LEN]> {
        self.embedded_public_key.as_ref()
    }

    /// Hex of the seed, for handing the secret to an operator once.
    pub fn seed_hex(&self) -> String {
        hex::encode(self.seed)
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret").finish_non_exhaustive()
    }
}
