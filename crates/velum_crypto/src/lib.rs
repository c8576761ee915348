//! velum_crypto — Velum Messenger cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited Rust crates.
//! - Zeroize secret material (seeds, private documents, plaintexts) on drop.
//! - Fail closed: decryption errors carry no detail an attacker could use.
//!
//! # Module layout
//! - `seed`   — identity-bound seed derivation (SHA-256 + HKDF-SHA256)
//! - `keys`   — RSA-2048 key pairs and their portable exchange documents
//! - `oaep`   — per-message dual RSA-OAEP encryption
//! - `seal`   — passphrase sealing of the private key (PBKDF2 + AES-256-GCM)
//! - `error`  — unified error type

pub mod error;
pub mod keys;
pub mod oaep;
pub mod seal;
pub mod seed;

pub use error::CryptoError;
pub use keys::{KeyPair, PrivateKeyDoc, PublicKeyDoc};
pub use oaep::DualCiphertext;
pub use seal::EncryptedKeyBlob;
pub use seed::Seed;
