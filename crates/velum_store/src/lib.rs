//! velum_store — Velum Messenger local key storage
//!
//! The private key exists on disk only as an `EncryptedKeyBlob` sealed by
//! `velum_crypto`; this crate decides where the blob's pieces live and who
//! may read them at runtime.
//!
//! - `keystore` — the `KeyStore` seam plus in-memory and single-file impls
//! - `vault`    — the four-record vault with its lock/unlock state machine
//! - `error`    — store error type
//!
//! Store layout (all values strings):
//!   `privateKeyBlob` — AES-GCM ciphertext, base64
//!   `publicKey`      — public key document, JSON
//!   `salt`           — PBKDF2 salt, base64
//!   `iv`             — AES-GCM nonce, base64

pub mod error;
pub mod keystore;
pub mod vault;

pub use error::StoreError;
pub use keystore::{FileKeyStore, KeyStore, MemoryKeyStore};
pub use vault::Vault;
