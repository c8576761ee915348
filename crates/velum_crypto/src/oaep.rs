//! RSA-OAEP (SHA-256) message encryption
//!
//! Message bodies are encrypted twice, once under the receiver's public key
//! and once under the sender's own, so both parties can reread the
//! conversation later. The two ciphertexts never share randomness: OAEP is
//! seeded fresh from the OS for every call.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rsa::Oaep;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::{PrivateKeyDoc, PublicKeyDoc};

/// Both ciphertexts produced for a single plaintext, standard base64.
#[derive(Debug, Clone)]
pub struct DualCiphertext {
    /// Encrypted under the receiver's public key.
    pub for_receiver: String,
    /// Encrypted under the sender's own public key.
    pub for_sender: String,
}

/// Encrypt `plaintext` under both parties' public keys.
///
/// All-or-nothing: if either encryption fails, no ciphertext is returned.
/// OAEP bounds the plaintext at modulus length minus 66 bytes (190 bytes
/// for RSA-2048); longer bodies are an `Encryption` error.
pub fn encrypt_dual(
    plaintext: &str,
    receiver: &PublicKeyDoc,
    sender: &PublicKeyDoc,
) -> Result<DualCiphertext, CryptoError> {
    if plaintext.is_empty() {
        return Err(CryptoError::InvalidInput("plaintext is empty".into()));
    }
    let for_receiver = encrypt(receiver, plaintext.as_bytes())?;
    let for_sender = encrypt(sender, plaintext.as_bytes())?;
    Ok(DualCiphertext {
        for_receiver,
        for_sender,
    })
}

/// Encrypt `plaintext` for `recipient`, returning standard base64.
pub fn encrypt(recipient: &PublicKeyDoc, plaintext: &[u8]) -> Result<String, CryptoError> {
    let key = recipient.to_rsa()?;
    let ciphertext = key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypt a base64 OAEP ciphertext.
///
/// Fails closed: an empty or undecodable ciphertext and a padding failure
/// all collapse into `Decryption`. The plaintext buffer zeroizes on drop.
pub fn decrypt(private: &PrivateKeyDoc, ciphertext: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if ciphertext.is_empty() {
        return Err(CryptoError::Decryption);
    }
    let raw = STANDARD
        .decode(ciphertext)
        .map_err(|_| CryptoError::Decryption)?;
    let key = private.to_rsa()?;
    let plaintext = key
        .decrypt(Oaep::new::<Sha256>(), &raw)
        .map_err(|_| CryptoError::Decryption)?;
    Ok(Zeroizing::new(plaintext))
}
