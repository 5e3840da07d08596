use super::config::{resolve_config_path, FeedgateConfig};
use feedgate::crypto::verify_feed;
use feedgate::keys::{FeedKey, Signature};
use feedgate::store::{LoadOutcome, SignatureStore};
use std::sync::Arc;

/// One persisted signature and whether it still verifies under the
/// configured trust key.
#[derive(Debug, PartialEq, Eq)]
pub struct ListedSignature {
    pub feed: FeedKey,
    pub signature: Signature,
    pub valid: bool,
}

pub async fn list_signatures(
    config: &FeedgateConfig,
) -> Result<Vec<ListedSignature>, Box<dyn std::error::Error>> {
    let trust_key = config.trust_key()?;
    let mut store = SignatureStore::new(Arc::new(config.signatures_storage()));

    if store.load().await? == LoadOutcome::Empty {
        return Ok(Vec::new());
    }

    Ok(store
        .iter()
        .map(|(feed, signature)| ListedSignature {
            feed: *feed,
            signature: *signature,
            valid: verify_feed(feed, Some(signature), &trust_key),
        })
        .collect())
}

pub async fn execute(config: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = FeedgateConfig::load(&resolve_config_path(config))?;
    let listed = list_signatures(&config).await?;

    if listed.is_empty() {
        println!("No signatures in {}", config.store.path.display());
        return Ok(());
    }

    for entry in &listed {
        let marker = if entry.valid { "ok" } else { "INVALID" };
        println!("{}  {}  {}", entry.feed, entry.signature, marker);
    }
    println!("{} signature(s)", listed.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedgate::crypto::{generate_secret, public_key_of, Signer};
    use feedgate::storage::RandomAccess;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_list_empty_store() {
        let dir = TempDir::new().unwrap();
        let trust = public_key_of(&generate_secret().unwrap()).unwrap();
        let config = FeedgateConfig::new(&trust, dir.path().join("store"));

        assert!(list_signatures(&config).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_flags_foreign_signatures() {
        let dir = TempDir::new().unwrap();
        let secret = generate_secret().unwrap();
        let trust = public_key_of(&secret).unwrap();
        let config = FeedgateConfig::new(&trust, dir.path().join("store"));

        let ours = FeedKey::from_bytes([0x01; 32]);
        let theirs = FeedKey::from_bytes([0x02; 32]);
        let good = Signer::new(&secret, trust).unwrap().sign(&ours).unwrap();
        let bogus = Signature::from_bytes([0u8; 64]);

        let storage: Arc<dyn RandomAccess> = Arc::new(config.signatures_storage());
        let mut store = SignatureStore::new(storage);
        store.insert(ours, good);
        store.insert(theirs, bogus);
        store.persist().await.unwrap();

        let listed = list_signatures(&config).await.unwrap();
        assert_eq!(
            listed,
            vec![
                ListedSignature {
                    feed: ours,
                    signature: good,
                    valid: true,
                },
                ListedSignature {
                    feed: theirs,
                    signature: bogus,
                    valid: false,
                },
            ]
        );
    }
}
