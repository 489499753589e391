//! Round secrets from a signing wallet.
//!
//! The service never holds wallet keys. It asks a [`SecretSource`] to sign
//! the round message and derives the commitment secret from the signature,
//! so attest and reveal for the same round agree without storing anything.

use async_trait::async_trait;
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use game_core::{round_signature_message, secret_from_signature};

use crate::api::{Result, RuntimeError};

/// Signs round messages on behalf of the player.
#[async_trait]
pub trait SecretSource: Send + Sync {
    /// Returns the hex signature of `message`.
    ///
    /// Must be deterministic: the same message signs to the same bytes.
    async fn sign(&self, message: &str) -> std::result::Result<String, String>;
}

/// Derives the commitment secret for the round opened at `nonce`.
pub async fn round_secret(source: &dyn SecretSource, nonce: u64) -> Result<BigUint> {
    let message = round_signature_message(nonce);
    let signature = source.sign(&message).await.map_err(RuntimeError::SecretSource)?;
    Ok(secret_from_signature(&signature)?)
}

/// Deterministic local signer: `sha256(seed ‖ message)`.
///
/// For local play and tests; it stands in for a wallet, not for its security.
#[derive(Clone)]
pub struct LocalSigner {
    seed: Vec<u8>,
}

impl LocalSigner {
    pub fn new(seed: impl Into<Vec<u8>>) -> Self {
        Self { seed: seed.into() }
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner").finish_non_exhaustive()
    }
}

#[async_trait]
impl SecretSource for LocalSigner {
    async fn sign(&self, message: &str) -> std::result::Result<String, String> {
        let mut hasher = Sha256::new();
        hasher.update(&self.seed);
        hasher.update(message.as_bytes());
        Ok(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl SecretSource for Failing {
        async fn sign(&self, _message: &str) -> std::result::Result<String, String> {
            Err("wallet locked".to_string())
        }
    }

    struct Garbage;

    #[async_trait]
    impl SecretSource for Garbage {
        async fn sign(&self, _message: &str) -> std::result::Result<String, String> {
            Ok("not-hex".to_string())
        }
    }

    #[tokio::test]
    async fn test_same_round_same_secret() {
        let signer = LocalSigner::new(b"seed".to_vec());
        let a = round_secret(&signer, 4).await.unwrap();
        let b = round_secret(&signer, 4).await.unwrap();
        let c = round_secret(&signer, 5).await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_different_seeds_differ() {
        let a = round_secret(&LocalSigner::new("alice"), 0).await.unwrap();
        let b = round_secret(&LocalSigner::new("bob"), 0).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_signer_errors_surface() {
        assert!(matches!(
            round_secret(&Failing, 0).await,
            Err(RuntimeError::SecretSource(msg)) if msg == "wallet locked"
        ));
        assert!(matches!(
            round_secret(&Garbage, 0).await,
            Err(RuntimeError::Signature(_))
        ));
    }
}
