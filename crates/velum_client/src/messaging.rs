//! Record decryption.

use velum_crypto::{oaep, CryptoError, PrivateKeyDoc};
use velum_proto::{MessageRecord, ViewerRole};

/// Decrypt the ciphertext slot `role` selects from `record`.
///
/// Strict: a missing slot, an undecryptable ciphertext and a non-UTF-8
/// plaintext are all `Decryption` errors. Never substitutes placeholder
/// text for a failure.
pub fn decrypt_record(
    record: &MessageRecord,
    role: ViewerRole,
    private: &PrivateKeyDoc,
) -> Result<String, CryptoError> {
    let ciphertext = record
        .ciphertext_for(role)
        .ok_or(CryptoError::Decryption)?;
    let plaintext = oaep::decrypt(private, ciphertext)?;
    String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::Decryption)
}
