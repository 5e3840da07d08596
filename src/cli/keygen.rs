use super::secret::{generate_mnemonic, save_secret_to_file};
use feedgate::crypto::{generate_secret, public_key_of, TrustKeyring};
use feedgate::keys::TrustKey;
use std::path::Path;
use zeroize::Zeroizing;

/// A fresh trust key and the secret text that signs under it.
pub struct GeneratedKeys {
    pub trust_key: TrustKey,
    /// Hex seed, or a 24-word mnemonic when requested
    pub secret: Zeroizing<String>,
}

pub fn generate_keys(mnemonic: bool) -> Result<GeneratedKeys, Box<dyn std::error::Error>> {
    if mnemonic {
        let phrase = generate_mnemonic()?;
        let keyring = TrustKeyring::from_mnemonic(&phrase)?;
        Ok(GeneratedKeys {
            trust_key: keyring.trust_key(),
            secret: phrase,
        })
    } else {
        let secret = generate_secret()?;
        Ok(GeneratedKeys {
            trust_key: public_key_of(&secret)?,
            secret: Zeroizing::new(secret.seed_hex()),
        })
    }
}

/// Generate a trust key pair. The secret goes to `output` when given,
/// otherwise it is shown once on stderr.
pub fn execute(mnemonic: bool, output: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let keys = generate_keys(mnemonic)?;

    match output {
        Some(path) => {
            let path = Path::new(&path);
            save_secret_to_file(&keys.secret, path)?;
            eprintln!("Signing secret written to {} (mode 0600)", path.display());
        }
        None => {
            eprintln!();
            eprintln!("Signing secret (shown once, store it securely):");
            eprintln!("  {}", keys.secret.as_str());
            eprintln!();
            eprintln!("Only nodes that create feeds need this secret.");
        }
    }

    println!("{}", keys.trust_key);
    Ok(())
}
