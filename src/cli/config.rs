//! feedgate configuration file handling
//!
//! A node's configuration names the trust key it filters against and where
//! its signature record lives. The signing secret is never written here;
//! at most the config points at a file holding it.

use feedgate::keys::TrustKey;
use feedgate::storage::FileStorage;
use feedgate::store::SIGNATURES_FILE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedgateConfig {
    /// Trust root configuration
    pub trust: TrustConfig,

    /// Signature record location
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Hex-encoded 32-byte trust key
    pub key: String,

    /// File holding the signing secret (hex seed or mnemonic). Only writer
    /// nodes set this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding `signatures.json`
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl FeedgateConfig {
    /// In-memory configuration, for tests that skip the commented template.
    #[cfg(test)]
    pub fn new(trust_key: &TrustKey, store_path: PathBuf) -> Self {
        Self {
            trust: TrustConfig {
                key: trust_key.to_hex(),
                secret_file: None,
            },
            store: StoreConfig { path: store_path },
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;

        let config: FeedgateConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    #[cfg(test)]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Decode the configured trust key.
    pub fn trust_key(&self) -> Result<TrustKey, Box<dyn std::error::Error>> {
        TrustKey::decode(self.trust.key.as_str())
            .map_err(|e| format!("Invalid trust key in config: {}", e).into())
    }

    /// File-backed storage for this node's signature record.
    pub fn signatures_storage(&self) -> FileStorage {
        FileStorage::open_in(&self.store.path, SIGNATURES_FILE)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(
        trust_key: &TrustKey,
        store_path: &Path,
        secret_file: Option<&Path>,
    ) -> String {
        let secret_line = match secret_file {
            Some(path) => format!("secret_file = \"{}\"", path.display()),
            None => "# secret_file = \"/run/secrets/feedgate-secret\"".to_string(),
        };

        format!(
            r#"# feedgate node configuration
#
# Every node sharing this trust key replicates the same set of feeds.
# Only nodes that can sign new feeds need a signing secret.

[trust]
# Hex-encoded Ed25519 public key all feed signatures must verify under
key = "{trust_key}"

# File holding the signing secret (hex seed or BIP-39 mnemonic).
# Leave commented on read-only nodes.
{secret_line}

[store]
# Directory for the persisted signature record
path = "{store_path}"
"#,
            trust_key = trust_key.to_hex(),
            store_path = store_path.display(),
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        trust_key: &TrustKey,
        store_path: &Path,
        secret_file: Option<&Path>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(trust_key, store_path, secret_file);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Base directory for feedgate data: ~/.local/share/feedgate
fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("feedgate")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    data_root().join("config.toml")
}

/// Get the default signature store directory
pub fn default_store_path() -> PathBuf {
    data_root().join("store")
}

/// Resolve a `--config` argument, falling back to the default location.
pub fn resolve_config_path(config: Option<String>) -> PathBuf {
    config.map(PathBuf::from).unwrap_or_else(default_config_path)
}
