//! Passphrase sealing for the private key document
//!
//! `seal` wraps the private key JSON in AES-256-GCM under a key stretched
//! from the user's passphrase with PBKDF2-HMAC-SHA256. Salt and IV are
//! drawn fresh from the OS on every seal. The resulting blob is the only
//! form in which the private key may touch persistent storage.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use pbkdf2::pbkdf2_hmac;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CryptoError;
use crate::keys::PrivateKeyDoc;

/// PBKDF2-HMAC-SHA256 round count. 100k is the floor; raising it only
/// affects blobs sealed after the change, old blobs reopen regardless
/// because the count is fixed at seal time.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

pub const SALT_LEN: usize = 16;
pub const IV_LEN: usize = 12;

/// A sealed private key: AES-256-GCM ciphertext plus the non-secret
/// parameters needed to open it again. Safe to persist and to `Debug`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedKeyBlob {
    /// GCM ciphertext with the 16-byte authentication tag appended.
    pub ciphertext: Vec<u8>,
    /// PBKDF2 salt, fresh per seal.
    pub salt: [u8; SALT_LEN],
    /// GCM nonce, fresh per seal.
    pub iv: [u8; IV_LEN],
}

/// 32-byte sealing key stretched from the passphrase. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
struct SealKey([u8; 32]);

fn stretch_passphrase(passphrase: &str, salt: &[u8; SALT_LEN]) -> SealKey {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    SealKey(key)
}

/// Seal `private` under `passphrase`.
pub fn seal(private: &PrivateKeyDoc, passphrase: &str) -> Result<EncryptedKeyBlob, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut salt);
    OsRng.fill_bytes(&mut iv);

    let key = stretch_passphrase(passphrase, &salt);
    let cipher = Aes256Gcm::new_from_slice(&key.0)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let plaintext = Zeroizing::new(serde_json::to_vec(private)?);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&iv), plaintext.as_slice())
        .map_err(|_| CryptoError::Encryption("AEAD seal failed".into()))?;

    Ok(EncryptedKeyBlob {
        ciphertext,
        salt,
        iv,
    })
}

/// Open a sealed blob. Any failure, including a wrong passphrase and a
/// flipped ciphertext bit, collapses into `Decryption`.
pub fn unseal(blob: &EncryptedKeyBlob, passphrase: &str) -> Result<PrivateKeyDoc, CryptoError> {
    if blob.ciphertext.is_empty() {
        return Err(CryptoError::Decryption);
    }

    let key = stretch_passphrase(passphrase, &blob.salt);
    let cipher = Aes256Gcm::new_from_slice(&key.0).map_err(|_| CryptoError::Decryption)?;

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&blob.iv), blob.ciphertext.as_slice())
            .map_err(|_| CryptoError::Decryption)?,
    );
    serde_json::from_slice(&plaintext).map_err(|_| CryptoError::Decryption)
}
