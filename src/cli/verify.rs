use super::config::{resolve_config_path, FeedgateConfig};
use feedgate::crypto::verify_encoded;
use feedgate::keys::KeyMaterial;

/// Check `signature` over `feed` under `trust_key`, or under the configured
/// trust key when none is given.
pub fn execute(
    feed: String,
    signature: String,
    trust_key: Option<String>,
    config: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let trust_key = match trust_key {
        Some(key) => key,
        None => FeedgateConfig::load(&resolve_config_path(config))?.trust.key,
    };

    let valid = verify_encoded(
        Some(KeyMaterial::Hex(&feed)),
        Some(KeyMaterial::Hex(&signature)),
        Some(KeyMaterial::Hex(&trust_key)),
    );

    if !valid {
        return Err(format!("Signature does not verify for feed {}", feed).into());
    }
    println!("valid");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedgate::crypto::{generate_secret, public_key_of, Signer};
    use feedgate::keys::FeedKey;
    use tempfile::TempDir;

    #[test]
    fn test_verify_with_explicit_trust_key() {
        let secret = generate_secret().unwrap();
        let trust = public_key_of(&secret).unwrap();
        let feed = FeedKey::from_bytes([0x0f; 32]);
        let signature = Signer::new(&secret, trust).unwrap().sign(&feed).unwrap();

        execute(
            feed.to_hex(),
            signature.to_hex(),
            Some(trust.to_hex()),
            None,
        )
        .unwrap();

        let other = FeedKey::from_bytes([0xf0; 32]);
        assert!(execute(other.to_hex(), signature.to_hex(), Some(trust.to_hex()), None).is_err());
    }

    #[test]
    fn test_verify_with_configured_trust_key() {
        let dir = TempDir::new().unwrap();
        let secret = generate_secret().unwrap();
        let trust = public_key_of(&secret).unwrap();
        let config_path = dir.path().join("config.toml");
        FeedgateConfig::new(&trust, dir.path().join("store"))
            .save(&config_path)
            .unwrap();

        let feed = FeedKey::from_bytes([0x0f; 32]);
        let signature = Signer::new(&secret, trust).unwrap().sign(&feed).unwrap();

        execute(
            feed.to_hex(),
            signature.to_hex(),
            None,
            Some(config_path.to_string_lossy().to_string()),
        )
        .unwrap();
    }

    #[test]
    fn test_verify_malformed_input_is_invalid() {
        let trust = "00".repeat(32);
        assert!(execute("zz".to_string(), "00".to_string(), Some(trust), None).is_err());
    }
}
