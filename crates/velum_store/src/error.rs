//! Store error type.

use thiserror::Error;
use velum_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The private key is sealed; `Vault::unlock` has not run this session.
    #[error("Vault is locked")]
    VaultLocked,

    /// Key material already exists. Only `Vault::clear` may empty the
    /// store; generation never overwrites silently.
    #[error("Vault is already provisioned; clear it before generating new keys")]
    AlreadyProvisioned,

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A persisted record failed to decode. Distinct from `Crypto`: the
    /// store itself is damaged, no passphrase will help.
    #[error("Stored key material is corrupt: {0}")]
    Corrupt(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
