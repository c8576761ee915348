//! Local key vault.
//!
//! Owns the four persisted records (`privateKeyBlob`, `publicKey`, `salt`,
//! `iv`) on top of an injected `KeyStore`, and caches the unsealed private
//! document in memory while the vault is unlocked.
//!
//! Lifecycle: provisioned once at first key generation, read on every
//! session start, cleared on sign-out. Read-mostly: a single writer
//! provisions or clears, any number of readers decrypt concurrently.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::sync::RwLock;

use velum_crypto::seal::{self, EncryptedKeyBlob, IV_LEN, SALT_LEN};
use velum_crypto::{PrivateKeyDoc, PublicKeyDoc};

use crate::error::StoreError;
use crate::keystore::KeyStore;

pub const STORE_KEY_PRIVATE_BLOB: &str = "privateKeyBlob";
pub const STORE_KEY_PUBLIC: &str = "publicKey";
pub const STORE_KEY_SALT: &str = "salt";
pub const STORE_KEY_IV: &str = "iv";

/// Cheap to clone; clones share the same store and unlock state.
#[derive(Clone)]
pub struct Vault {
    store: Arc<dyn KeyStore>,
    unlocked: Arc<RwLock<Option<PrivateKeyDoc>>>,
}

impl Vault {
    pub fn new(store: Arc<dyn KeyStore>) -> Self {
        Self {
            store,
            unlocked: Arc::new(RwLock::new(None)),
        }
    }

    /// Whether key material has been generated for this store.
    pub fn is_provisioned(&self) -> Result<bool, StoreError> {
        Ok(self.store.get(STORE_KEY_PRIVATE_BLOB)?.is_some())
    }

    /// Persist a freshly sealed key pair. Refused once provisioned; the
    /// stored pair only ever changes after an explicit `clear`.
    pub fn provision(
        &self,
        blob: &EncryptedKeyBlob,
        public: &PublicKeyDoc,
    ) -> Result<(), StoreError> {
        if self.is_provisioned()? {
            return Err(StoreError::AlreadyProvisioned);
        }
        self.store
            .set(STORE_KEY_PUBLIC, &serde_json::to_string(public)?)?;
        self.store.set(STORE_KEY_SALT, &STANDARD.encode(blob.salt))?;
        self.store.set(STORE_KEY_IV, &STANDARD.encode(blob.iv))?;
        // Blob last: `is_provisioned` keys off this record, so a provision
        // torn by a store failure reads as unprovisioned and retries cleanly.
        self.store
            .set(STORE_KEY_PRIVATE_BLOB, &STANDARD.encode(&blob.ciphertext))?;
        tracing::info!(
            target: "velum",
            event = "vault_provisioned",
            fingerprint = %public.fingerprint()
        );
        Ok(())
    }

    /// The locally persisted public key document.
    pub fn public_key(&self) -> Result<PublicKeyDoc, StoreError> {
        let raw = self
            .store
            .get(STORE_KEY_PUBLIC)?
            .ok_or_else(|| StoreError::NotFound(STORE_KEY_PUBLIC.into()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Reassemble the sealed blob from its three stored records.
    pub fn load_blob(&self) -> Result<EncryptedKeyBlob, StoreError> {
        let ciphertext = self.decode_record(STORE_KEY_PRIVATE_BLOB)?;
        let salt: [u8; SALT_LEN] = self
            .decode_record(STORE_KEY_SALT)?
            .try_into()
            .map_err(|_| StoreError::Corrupt(format!("{STORE_KEY_SALT} is not {SALT_LEN} bytes")))?;
        let iv: [u8; IV_LEN] = self
            .decode_record(STORE_KEY_IV)?
            .try_into()
            .map_err(|_| StoreError::Corrupt(format!("{STORE_KEY_IV} is not {IV_LEN} bytes")))?;
        Ok(EncryptedKeyBlob {
            ciphertext,
            salt,
            iv,
        })
    }

    fn decode_record(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let raw = self
            .store
            .get(key)?
            .ok_or_else(|| StoreError::NotFound(key.into()))?;
        STANDARD
            .decode(raw)
            .map_err(|_| StoreError::Corrupt(format!("{key} is not valid base64")))
    }

    /// Unseal the private key with `passphrase` and cache it until `lock`
    /// or `clear`. A wrong passphrase surfaces as a `Decryption` error and
    /// leaves the vault locked.
    pub async fn unlock(&self, passphrase: &str) -> Result<(), StoreError> {
        let blob = self.load_blob()?;
        let private = seal::unseal(&blob, passphrase)?;
        *self.unlocked.write().await = Some(private);
        tracing::info!(target: "velum", event = "vault_unlocked");
        Ok(())
    }

    /// Drop the cached private key. Its heap copies zeroize on drop.
    pub async fn lock(&self) {
        *self.unlocked.write().await = None;
        tracing::info!(target: "velum", event = "vault_locked");
    }

    pub async fn is_locked(&self) -> bool {
        self.unlocked.read().await.is_none()
    }

    /// Run `f` against the unlocked private document without handing out
    /// an owned copy.
    pub async fn with_private<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&PrivateKeyDoc) -> Result<R, StoreError>,
    {
        let guard = self.unlocked.read().await;
        let private = guard.as_ref().ok_or(StoreError::VaultLocked)?;
        f(private)
    }

    /// Wipe every stored record and the cached key. After this the vault
    /// is unprovisioned and the next key generation starts fresh.
    pub async fn clear(&self) -> Result<(), StoreError> {
        *self.unlocked.write().await = None;
        self.store.clear()?;
        tracing::info!(target: "velum", event = "vault_cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keystore::MemoryKeyStore;
    use velum_crypto::CryptoError;

    fn sample_private() -> PrivateKeyDoc {
        PrivateKeyDoc {
            kty: "RSA".into(),
            n: "qqE".into(),
            e: "AQAB".into(),
            d: "Uv0".into(),
            p: "B_c".into(),
            q: "Cw".into(),
            dp: "Aw".into(),
            dq: "Bw".into(),
            qi: "BA".into(),
        }
    }

    fn provisioned_vault(passphrase: &str) -> Vault {
        let vault = Vault::new(Arc::new(MemoryKeyStore::new()));
        let private = sample_private();
        let blob = seal::seal(&private, passphrase).unwrap();
        vault.provision(&blob, &private.public_doc()).unwrap();
        vault
    }

    #[tokio::test]
    async fn provision_unlock_read_roundtrip() {
        let vault = provisioned_vault("user-passphrase");
        assert!(vault.is_provisioned().unwrap());
        assert!(vault.is_locked().await);

        vault.unlock("user-passphrase").await.unwrap();
        assert!(!vault.is_locked().await);

        let d = vault
            .with_private(|private| Ok(private.d.clone()))
            .await
            .unwrap();
        assert_eq!(d, sample_private().d);
        assert_eq!(vault.public_key().unwrap(), sample_private().public_doc());
    }

    #[tokio::test]
    async fn second_provision_is_refused() {
        let vault = provisioned_vault("user-passphrase");
        let blob = seal::seal(&sample_private(), "other").unwrap();
        assert!(matches!(
            vault.provision(&blob, &sample_private().public_doc()),
            Err(StoreError::AlreadyProvisioned)
        ));
    }

    #[tokio::test]
    async fn wrong_passphrase_leaves_vault_locked() {
        let vault = provisioned_vault("user-passphrase");
        assert!(matches!(
            vault.unlock("wrong").await,
            Err(StoreError::Crypto(CryptoError::Decryption))
        ));
        assert!(vault.is_locked().await);
    }

    #[tokio::test]
    async fn locked_vault_denies_private_access() {
        let vault = provisioned_vault("user-passphrase");
        let denied = vault.with_private(|_| Ok(())).await;
        assert!(matches!(denied, Err(StoreError::VaultLocked)));

        vault.unlock("user-passphrase").await.unwrap();
        vault.lock().await;
        let denied_again = vault.with_private(|_| Ok(())).await;
        assert!(matches!(denied_again, Err(StoreError::VaultLocked)));
    }

    #[tokio::test]
    async fn clear_unprovisions_and_locks() {
        let vault = provisioned_vault("user-passphrase");
        vault.unlock("user-passphrase").await.unwrap();

        vault.clear().await.unwrap();
        assert!(!vault.is_provisioned().unwrap());
        assert!(vault.is_locked().await);
        assert!(matches!(
            vault.public_key(),
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_records_are_reported_as_corrupt() {
        let store = Arc::new(MemoryKeyStore::new());
        let vault = Vault::new(store.clone());
        let blob = seal::seal(&sample_private(), "pw").unwrap();
        vault.provision(&blob, &sample_private().public_doc()).unwrap();

        store.set(STORE_KEY_SALT, "AAAA").unwrap(); // decodes to 3 bytes
        assert!(matches!(
            vault.load_blob(),
            Err(StoreError::Corrupt(_))
        ));

        store.set(STORE_KEY_SALT, "*** not base64 ***").unwrap();
        assert!(matches!(
            vault.load_blob(),
            Err(StoreError::Corrupt(_))
        ));
    }

    /// Fails the first `set` of one chosen key, then behaves normally.
    struct FlakyStore {
        inner: MemoryKeyStore,
        fail_key: &'static str,
        armed: std::sync::atomic::AtomicBool,
    }

    impl FlakyStore {
        fn new(fail_key: &'static str) -> Self {
            Self {
                inner: MemoryKeyStore::new(),
                fail_key,
                armed: std::sync::atomic::AtomicBool::new(true),
            }
        }
    }

    impl crate::keystore::KeyStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            if key == self.fail_key
                && self.armed.swap(false, std::sync::atomic::Ordering::SeqCst)
            {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }

        fn clear(&self) -> Result<(), StoreError> {
            self.inner.clear()
        }
    }

    #[tokio::test]
    async fn torn_provision_reads_as_unprovisioned_and_retries() {
        for fail_key in [
            STORE_KEY_PUBLIC,
            STORE_KEY_SALT,
            STORE_KEY_IV,
            STORE_KEY_PRIVATE_BLOB,
        ] {
            let vault = Vault::new(Arc::new(FlakyStore::new(fail_key)));
            let private = sample_private();
            let blob = seal::seal(&private, "user-passphrase").unwrap();

            let torn = vault.provision(&blob, &private.public_doc());
            assert!(matches!(torn, Err(StoreError::Io(_))), "key {fail_key}");
            assert!(
                !vault.is_provisioned().unwrap(),
                "torn provision on {fail_key} must not look provisioned"
            );

            // The store recovered; the retry must not hit AlreadyProvisioned
            // and must leave a fully readable vault.
            vault.provision(&blob, &private.public_doc()).unwrap();
            vault.unlock("user-passphrase").await.unwrap();
        }
    }

    #[tokio::test]
    async fn unprovisioned_vault_reports_not_found() {
        let vault = Vault::new(Arc::new(MemoryKeyStore::new()));
        assert!(!vault.is_provisioned().unwrap());
        assert!(matches!(
            vault.unlock("anything").await,
            Err(StoreError::NotFound(_))
        ));
    }
}
