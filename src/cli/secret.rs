//! Signing secret delivery.
//!
//! A writer node's secret is either a hex seed (32 bytes, or 64 bytes with
//! the public half appended) or a BIP-39 mnemonic from which the seed is
//! derived. It arrives from a file, the environment, or a masked prompt.

use super::config::FeedgateConfig;
use feedgate::crypto::TrustKeyring;
use feedgate::keys::SigningSecret;
use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Environment variable consulted when no secret file is given.
pub const SECRET_ENV_VAR: &str = "FEEDGATE_SECRET";

/// Modes for secret delivery, checked in order
#[derive(Debug, PartialEq, Eq)]
pub enum SecretSource {
    /// From --secret-file or `trust.secret_file`
    File(PathBuf),
    /// From FEEDGATE_SECRET (warned as insecure)
    EnvVar,
    /// From a masked stdin prompt
    Stdin,
}

/// Generate a 24-word BIP-39 mnemonic (256 bits of entropy).
pub fn generate_mnemonic() -> Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    use bip39::{Language, Mnemonic};
    use rand::RngCore;

    let mut entropy = Zeroizing::new([0u8; 32]);
    rand::thread_rng().fill_bytes(&mut entropy[..]);

    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy[..])
        .map_err(|e| format!("Failed to generate mnemonic: {}", e))?;

    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// Pick the secret source: CLI flag, then config, then environment, then
/// prompt.
pub fn determine_secret_source(
    secret_file: Option<String>,
    config: Option<&FeedgateConfig>,
) -> SecretSource {
    if let Some(file) = secret_file {
        SecretSource::File(PathBuf::from(file))
    } else if let Some(file) = config.and_then(|c| c.trust.secret_file.clone()) {
        SecretSource::File(file)
    } else if std::env::var(SECRET_ENV_VAR).is_ok() {
        SecretSource::EnvVar
    } else {
        SecretSource::Stdin
    }
}

/// Read the raw secret text from `source`, trimmed.
pub fn read_secret(
    source: SecretSource,
    prompt: Option<&str>,
) -> Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    let text = match source {
        SecretSource::File(path) => {
            if !path.exists() {
                return Err(format!("Secret file not found: {}", path.display()).into());
            }
            let raw = Zeroizing::new(
                fs::read_to_string(&path)
                    .map_err(|e| format!("Failed to read secret file: {}", e))?,
            );
            Zeroizing::new(raw.trim().to_string())
        }
        SecretSource::EnvVar => {
            eprintln!("WARNING: reading the signing secret from {SECRET_ENV_VAR} is insecure");
            eprintln!("   Consider using --secret-file instead");
            let raw = Zeroizing::new(
                std::env::var(SECRET_ENV_VAR)
                    .map_err(|_| format!("{SECRET_ENV_VAR} env var not set"))?,
            );
            Zeroizing::new(raw.trim().to_string())
        }
        SecretSource::Stdin => {
            let raw = Zeroizing::new(
                rpassword::prompt_password(prompt.unwrap_or("Signing secret: "))
                    .map_err(|e| format!("Failed to read secret from stdin: {}", e))?,
            );
            Zeroizing::new(raw.trim().to_string())
        }
    };

    if text.is_empty() {
        return Err("Signing secret is empty".into());
    }
    Ok(text)
}

/// Interpret secret text. Multiple words are a mnemonic; anything else must
/// be hex.
pub fn parse_secret(text: &str) -> Result<SigningSecret, Box<dyn std::error::Error>> {
    let text = text.trim();
    if text.split_whitespace().nth(1).is_some() {
        let keyring = TrustKeyring::from_mnemonic(text)?;
        return Ok(keyring.signing_secret());
    }
    SigningSecret::decode(text).map_err(|e| format!("Invalid signing secret: {}", e).into())
}

/// Write `secret` to `path` readable only by the owner.
pub fn save_secret_to_file(secret: &str, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create secret directory: {}", e))?;
    }

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .map_err(|e| format!("Failed to create secret file '{}': {}", path.display(), e))?;

    writeln!(file, "{}", secret)
        .map_err(|e| format!("Failed to write secret to '{}': {}", path.display(), e))?;

    Ok(())
}
