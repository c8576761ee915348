//! Unified error type for all cryptographic operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// Caller-supplied input was rejected before any crypto ran.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Seed expansion or RSA key generation failed.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// A key document was missing parameters or carried undecodable ones.
    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Deliberately carries no detail: wrong passphrase, tampered data and
    /// malformed ciphertext are indistinguishable to the caller.
    #[error("Decryption failed (wrong passphrase, tampered data, or malformed ciphertext)")]
    Decryption,

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
}
