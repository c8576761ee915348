//! Idempotent key-pair provisioning.

use velum_crypto::{keys, seal, seed, CryptoError, PublicKeyDoc};
use velum_store::{StoreError, Vault};

use crate::error::ClientError;

/// Generates, seals and persists the account key pair.
#[derive(Clone)]
pub struct KeyService {
    vault: Vault,
}

impl KeyService {
    pub fn new(vault: Vault) -> Self {
        Self { vault }
    }

    /// Ensure a key pair exists, returning the public half.
    ///
    /// Idempotent: once the vault is provisioned the stored public key is
    /// returned untouched, whatever identity or passphrase is supplied.
    /// Generation runs on the blocking pool; RSA-2048 takes a noticeable
    /// fraction of a second.
    pub async fn generate_key_pair(
        &self,
        identity: &str,
        passphrase: &str,
    ) -> Result<PublicKeyDoc, ClientError> {
        // Derived first so an invalid identity fails the same way on both
        // the fresh and the provisioned path.
        let seed = seed::derive_seed(identity)?;

        if self.vault.is_provisioned()? {
            let public = self.vault.public_key()?;
            tracing::info!(
                target: "velum",
                event = "keypair_reused",
                fingerprint = %public.fingerprint()
            );
            return Ok(public);
        }

        let pair = tokio::task::spawn_blocking(move || keys::generate_rsa_keypair(&seed))
            .await
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))??;

        let blob = seal::seal(&pair.private, passphrase)?;
        match self.vault.provision(&blob, &pair.public) {
            Ok(()) => {
                tracing::info!(
                    target: "velum",
                    event = "keypair_generated",
                    fingerprint = %pair.public.fingerprint()
                );
                Ok(pair.public)
            }
            // A concurrent call provisioned the store while we generated;
            // its pair is the stored one, ours is discarded.
            Err(StoreError::AlreadyProvisioned) => {
                let public = self.vault.public_key()?;
                tracing::info!(
                    target: "velum",
                    event = "keypair_reused",
                    fingerprint = %public.fingerprint()
                );
                Ok(public)
            }
            Err(err) => Err(err.into()),
        }
    }
}
