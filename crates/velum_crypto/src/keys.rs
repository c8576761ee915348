//! RSA key pairs and their portable exchange documents
//!
//! Keys cross process and network boundaries as JSON documents carrying
//! base64url-encoded (unpadded, big-endian) RSA parameters:
//!
//! - `PublicKeyDoc`  — `kty`, `n`, `e`; published to the user directory.
//! - `PrivateKeyDoc` — the full parameter set including CRT values; never
//!   leaves the device except sealed inside an `EncryptedKeyBlob`.
//!
//! Documents are validated on every import; a missing or undecodable
//! parameter is an `InvalidKey` error, not a later decrypt failure.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;
use crate::seed::{Seed, SEED_LEN};

/// Modulus size for generated keys. 2048 is the floor, not a target;
/// existing peers must keep decrypting if this is ever raised.
pub const RSA_MODULUS_BITS: usize = 2048;

const KEY_TYPE_RSA: &str = "RSA";

// ── Exchange documents ────────────────────────────────────────────────────────

/// Public half of an RSA key pair, in the exchange format shared with peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyDoc {
    /// Key type tag, always `"RSA"`.
    pub kty: String,
    /// Modulus, base64url (unpadded, big-endian).
    pub n: String,
    /// Public exponent, base64url. Generated keys always use 65537.
    pub e: String,
}

/// Private half of an RSA key pair. Carries the full parameter set so the
/// key can be reconstructed without refactoring the modulus.
///
/// No `Debug` impl: private parameters must never reach logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[cfg_attr(test, derive(Debug))]
pub struct PrivateKeyDoc {
    pub kty: String,
    pub n: String,
    pub e: String,
    /// Private exponent.
    pub d: String,
    /// First prime factor.
    pub p: String,
    /// Second prime factor.
    pub q: String,
    /// `d mod (p-1)`.
    pub dp: String,
    /// `d mod (q-1)`.
    pub dq: String,
    /// `q^-1 mod p`.
    pub qi: String,
}

/// Freshly generated pair. The private half zeroizes itself on drop.
pub struct KeyPair {
    pub public: PublicKeyDoc,
    pub private: PrivateKeyDoc,
}

// ── Generation ────────────────────────────────────────────────────────────────

/// Generate a new RSA-2048 key pair.
///
/// The identity seed is mixed with fresh OS entropy before keying the RNG.
/// The seed is auxiliary input only: key stability across sign-ins comes
/// from the local key store, never from re-derivation, so two calls with
/// the same seed produce unrelated keys.
pub fn generate_rsa_keypair(seed: &Seed) -> Result<KeyPair, CryptoError> {
    let mut material = [0u8; SEED_LEN];
    OsRng.fill_bytes(&mut material);
    for (byte, seed_byte) in material.iter_mut().zip(seed.as_bytes()) {
        *byte ^= seed_byte;
    }

    let mut rng = ChaCha20Rng::from_seed(material);
    material.zeroize();
    keypair_from_rng(&mut rng)
}

fn keypair_from_rng(rng: &mut ChaCha20Rng) -> Result<KeyPair, CryptoError> {
    let private = RsaPrivateKey::new(rng, RSA_MODULUS_BITS)
        .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
    export_keypair(&private)
}

/// Export both halves of `private` into exchange documents.
fn export_keypair(private: &RsaPrivateKey) -> Result<KeyPair, CryptoError> {
    let primes = private.primes();
    if primes.len() != 2 {
        return Err(CryptoError::KeyGeneration(format!(
            "expected 2 primes, got {}",
            primes.len()
        )));
    }
    let (n, e, d) = (private.n(), private.e(), private.d());
    let (p, q) = (&primes[0], &primes[1]);

    let one = BigUint::from(1u32);
    let two = BigUint::from(2u32);
    let dp = d % &(p - &one);
    let dq = d % &(q - &one);
    // q^-1 mod p by Fermat; p is prime.
    let qi = q.modpow(&(p - &two), p);

    Ok(KeyPair {
        public: PublicKeyDoc {
            kty: KEY_TYPE_RSA.to_string(),
            n: encode_param(n),
            e: encode_param(e),
        },
        private: PrivateKeyDoc {
            kty: KEY_TYPE_RSA.to_string(),
            n: encode_param(n),
            e: encode_param(e),
            d: encode_param(d),
            p: encode_param(p),
            q: encode_param(q),
            dp: encode_param(&dp),
            dq: encode_param(&dq),
            qi: encode_param(&qi),
        },
    })
}

// ── Import ────────────────────────────────────────────────────────────────────

impl PublicKeyDoc {
    /// Reconstruct the RSA public key, validating the document.
    pub fn to_rsa(&self) -> Result<RsaPublicKey, CryptoError> {
        check_kty(&self.kty)?;
        let n = decode_param(&self.n, "n")?;
        let e = decode_param(&self.e, "e")?;
        RsaPublicKey::new(n, e).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Short hex fingerprint of the public parameters, for display and
    /// out-of-band comparison.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.n.as_bytes());
        hasher.update(b".");
        hasher.update(self.e.as_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }
}

impl PrivateKeyDoc {
    /// Reconstruct the RSA private key, validating the full parameter set.
    /// The CRT parameters must be present and decodable even though the
    /// key is rebuilt from `n`, `e`, `d`, `p`, `q`.
    pub fn to_rsa(&self) -> Result<RsaPrivateKey, CryptoError> {
        check_kty(&self.kty)?;
        let n = decode_param(&self.n, "n")?;
        let e = decode_param(&self.e, "e")?;
        let d = decode_param(&self.d, "d")?;
        let p = decode_param(&self.p, "p")?;
        let q = decode_param(&self.q, "q")?;
        decode_param(&self.dp, "dp")?;
        decode_param(&self.dq, "dq")?;
        decode_param(&self.qi, "qi")?;

        let mut key = RsaPrivateKey::from_components(n, e, d, vec![p, q])
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        key.precompute()
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// The matching public document.
    pub fn public_doc(&self) -> PublicKeyDoc {
        PublicKeyDoc {
            kty: self.kty.clone(),
            n: self.n.clone(),
            e: self.e.clone(),
        }
    }
}

fn check_kty(kty: &str) -> Result<(), CryptoError> {
    if kty != KEY_TYPE_RSA {
        return Err(CryptoError::InvalidKey(format!(
            "unsupported key type {kty:?}"
        )));
    }
    Ok(())
}

fn encode_param(value: &BigUint) -> String {
    URL_SAFE_NO_PAD.encode(value.to_bytes_be())
}

fn decode_param(value: &str, name: &str) -> Result<BigUint, CryptoError> {
    if value.is_empty() {
        return Err(CryptoError::InvalidKey(format!("missing parameter {name}")));
    }
    let bytes = URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|_| CryptoError::InvalidKey(format!("undecodable parameter {name}")))?;
    Ok(BigUint::from_bytes_be(&bytes))
}

#[cfg(test)]
pub(crate) fn deterministic_keypair(tag: u8) -> KeyPair {
    let mut rng = ChaCha20Rng::from_seed([tag; 32]);
    keypair_from_rng(&mut rng).expect("deterministic keypair")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::derive_seed;

    #[test]
    fn generated_documents_carry_the_full_parameter_set() {
        let pair = deterministic_keypair(1);
        assert_eq!(pair.public.kty, "RSA");
        assert_eq!(pair.public.n, pair.private.n);
        assert_eq!(pair.public.e, pair.private.e);
        for param in [
            &pair.private.d,
            &pair.private.p,
            &pair.private.q,
            &pair.private.dp,
            &pair.private.dq,
            &pair.private.qi,
        ] {
            assert!(!param.is_empty());
        }
    }

    #[test]
    fn exported_documents_reimport() {
        let pair = deterministic_keypair(2);
        let public = pair.public.to_rsa().unwrap();
        assert_eq!(public.size(), RSA_MODULUS_BITS / 8);
        pair.private.to_rsa().unwrap();
    }

    #[test]
    fn crt_parameters_are_consistent() {
        let pair = deterministic_keypair(3);
        let d = decode_param(&pair.private.d, "d").unwrap();
        let p = decode_param(&pair.private.p, "p").unwrap();
        let q = decode_param(&pair.private.q, "q").unwrap();
        let dp = decode_param(&pair.private.dp, "dp").unwrap();
        let qi = decode_param(&pair.private.qi, "qi").unwrap();

        let one = BigUint::from(1u32);
        assert_eq!(dp, &d % &(&p - &one));
        assert_eq!((&qi * &q) % &p, one);
    }

    #[test]
    fn seed_mixing_never_repeats_keys() {
        let seed = derive_seed("alice@example.com").unwrap();
        let first = generate_rsa_keypair(&seed).unwrap();
        let second = generate_rsa_keypair(&seed).unwrap();
        assert_ne!(first.public.n, second.public.n);
    }

    #[test]
    fn import_rejects_wrong_key_type() {
        let mut doc = deterministic_keypair(4).public;
        doc.kty = "EC".into();
        assert!(matches!(doc.to_rsa(), Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn import_rejects_missing_modulus() {
        let mut doc = deterministic_keypair(4).public;
        doc.n = String::new();
        assert!(matches!(doc.to_rsa(), Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn import_rejects_undecodable_exponent() {
        let mut doc = deterministic_keypair(4).public;
        doc.e = "not base64url!".into();
        assert!(matches!(doc.to_rsa(), Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn fingerprints_are_stable_and_distinct() {
        let a = deterministic_keypair(5).public;
        let b = deterministic_keypair(6).public;
        assert_eq!(a.fingerprint(), a.fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 32);
    }
}
