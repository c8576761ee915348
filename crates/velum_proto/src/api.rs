//! API request/response types shared between clients and services.
//! These map directly to JSON bodies on the wire.

use serde::{Deserialize, Serialize};
use velum_crypto::PublicKeyDoc;

// ── Directory ────────────────────────────────────────────────────────────────

/// A user as listed by the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: String,
    pub username: String,
    /// Absent until the user has generated a key pair on some device.
    #[serde(default)]
    pub public_key: Option<PublicKeyDoc>,
}

// ── Messages ─────────────────────────────────────────────────────────────────

/// Body of a send request. Either both ciphertext slots are set (text
/// message) or neither is (attachment-only); the server stores what it is
/// given and never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub sender_id: String,
    pub receiver_id: String,
    pub encrypted_for_sender: Option<String>,
    pub encrypted_for_receiver: Option<String>,
    pub image: Option<String>,
    pub pdf: Option<String>,
}

// ── Common ───────────────────────────────────────────────────────────────────

/// Error body returned by every service endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
