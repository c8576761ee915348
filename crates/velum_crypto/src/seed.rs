//! Identity-bound seed derivation
//!
//! `derive_seed` — SHA-256 of the account identity, expanded through
//!   HKDF-SHA256 into 32 bytes of key-generation entropy. Deterministic:
//!   the same identity always yields the same seed.

use hkdf::Hkdf;
use sha2::{Digest, Sha256};
use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;

pub const SEED_LEN: usize = 32;

/// Fixed all-zero HKDF salt. Changing this breaks seed compatibility for
/// every existing account, so it is pinned here rather than configurable.
const HKDF_SALT: [u8; 16] = [0u8; 16];

/// Fixed HKDF context label, likewise pinned.
const HKDF_INFO: &[u8] = b"key-generation";

/// 32-byte key-generation seed derived from an identity. Zeroized on drop.
#[derive(ZeroizeOnDrop)]
pub struct Seed(pub [u8; SEED_LEN]);

impl Seed {
    pub fn as_bytes(&self) -> &[u8; SEED_LEN] {
        &self.0
    }
}

/// Derive the key-generation seed for an account identity (e-mail address
/// or equivalent stable identifier).
///
/// The identity is hashed with SHA-256 and the digest is expanded with
/// HKDF-SHA256 under a fixed salt and context label. Rejects empty and
/// whitespace-only identities.
pub fn derive_seed(identity: &str) -> Result<Seed, CryptoError> {
    if identity.trim().is_empty() {
        return Err(CryptoError::InvalidInput(
            "identity must be a non-empty string".into(),
        ));
    }

    let digest: [u8; 32] = Sha256::digest(identity.as_bytes()).into();

    let hk = Hkdf::<Sha256>::new(Some(&HKDF_SALT), &digest);
    let mut seed = [0u8; SEED_LEN];
    hk.expand(HKDF_INFO, &mut seed)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

    Ok(Seed(seed))
}
