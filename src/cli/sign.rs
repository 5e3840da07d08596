use super::config::{resolve_config_path, FeedgateConfig};
use super::secret::{determine_secret_source, parse_secret, read_secret};
use feedgate::gate::ReplicationGate;
use feedgate::keys::{FeedKey, Signature};
use std::sync::Arc;
use tracing::info;

/// Sign `feed` and record the signature in this node's store.
pub async fn sign_feed(
    config: &FeedgateConfig,
    feed: &str,
    secret_file: Option<String>,
) -> Result<Signature, Box<dyn std::error::Error>> {
    let trust_key = config.trust_key()?;
    let feed = FeedKey::decode(feed).map_err(|e| format!("Invalid feed key: {}", e))?;

    let source = determine_secret_source(secret_file, Some(config));
    let text = read_secret(source, Some("Signing secret or mnemonic: "))?;
    let secret = parse_secret(&text)?;

    let gate = ReplicationGate::new(
        trust_key,
        Arc::new(config.signatures_storage()),
        Some(secret),
    )?;
    gate.load().await?;

    let signature = gate
        .sign_feed(&feed)
        .await?
        .ok_or("No signing secret available")?;
    info!(feed = %feed, "feed signed");
    Ok(signature)
}

pub async fn execute(
    feed: String,
    config: Option<String>,
    secret_file: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = FeedgateConfig::load(&resolve_config_path(config))?;
    let signature = sign_feed(&config, &feed, secret_file).await?;
    println!("{}", signature);
    Ok(())
}
