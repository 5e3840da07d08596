use super::config::{default_store_path, resolve_config_path, FeedgateConfig};
use feedgate::keys::TrustKey;
use std::path::PathBuf;

/// Write a default configuration for a node under `trust_key`.
pub fn execute(
    trust_key: String,
    config: Option<String>,
    store_path: Option<String>,
    secret_file: Option<String>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let trust_key = TrustKey::decode(trust_key.as_str())
        .map_err(|e| format!("Invalid trust key: {}", e))?;

    let config_path = resolve_config_path(config);
    if config_path.exists() && !force {
        return Err(format!(
            "Config file already exists at '{}'. Use --force to overwrite.",
            config_path.display()
        )
        .into());
    }

    let store_path = store_path.map(PathBuf::from).unwrap_or_else(default_store_path);
    let secret_file = secret_file.map(PathBuf::from);

    FeedgateConfig::create_default(&config_path, &trust_key, &store_path, secret_file.as_deref())?;

    println!("Wrote {}", config_path.display());
    println!("Signatures will be kept in {}", store_path.display());
    if secret_file.is_none() {
        println!("No signing secret configured: this node relays but never signs.");
    }
    Ok(())
}
