//! Client error type.

use thiserror::Error;
use velum_crypto::CryptoError;
use velum_store::StoreError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Store failures that are not crypto failures underneath; those are
    /// flattened into `Crypto` so callers match on one variant.
    #[error("Store error: {0}")]
    Store(StoreError),

    #[error("Directory request failed: {0}")]
    Directory(String),

    #[error("Transport request failed: {0}")]
    Transport(String),

    #[error("No public key published for user {0}")]
    MissingPublicKey(String),

    #[error("Not signed in")]
    NotSignedIn,
}

impl From<StoreError> for ClientError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Crypto(inner) => ClientError::Crypto(inner),
            other => ClientError::Store(other),
        }
    }
}
