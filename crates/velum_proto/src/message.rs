//! Message records and viewer roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as stored by the server and delivered to clients.
///
/// The body is carried as two independent RSA-OAEP ciphertexts, one per
/// party; the server never sees plaintext. Attachment-only messages carry
/// no ciphertext at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Server-assigned record ID.
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    /// Body encrypted under the sender's public key, standard base64.
    pub encrypted_for_sender: Option<String>,
    /// Body encrypted under the receiver's public key, standard base64.
    pub encrypted_for_receiver: Option<String>,
    /// Image attachment reference (URL or data URI). Not encrypted.
    pub image: Option<String>,
    /// PDF attachment reference. Not encrypted.
    pub pdf: Option<String>,
    /// Server-assigned timestamp.
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// The ciphertext slot a viewer in `role` must decrypt. `None` for
    /// attachment-only records.
    pub fn ciphertext_for(&self, role: ViewerRole) -> Option<&str> {
        match role {
            ViewerRole::Sender => self.encrypted_for_sender.as_deref(),
            ViewerRole::Receiver => self.encrypted_for_receiver.as_deref(),
        }
    }

    /// Whether the record carries an encrypted text body.
    pub fn has_text(&self) -> bool {
        self.encrypted_for_sender.is_some() || self.encrypted_for_receiver.is_some()
    }

    /// Attachment-only records have a body of `""` by definition and are
    /// readable without any key material.
    pub fn is_attachment_only(&self) -> bool {
        !self.has_text() && (self.image.is_some() || self.pdf.is_some())
    }
}

/// Which side of the conversation is decrypting a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewerRole {
    Sender,
    Receiver,
}

impl ViewerRole {
    /// Role of `viewer_id` relative to `record`: the record's author reads
    /// the sender slot, everyone else the receiver slot.
    pub fn for_record(record: &MessageRecord, viewer_id: &str) -> Self {
        if record.sender_id == viewer_id {
            ViewerRole::Sender
        } else {
            ViewerRole::Receiver
        }
    }
}

/// A message the local user wants to send, before encryption.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    /// Plaintext body. May be empty when only attachments are sent.
    #[serde(default)]
    pub text: String,
    pub image: Option<String>,
    pub pdf: Option<String>,
}

impl OutgoingMessage {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            text: body.into(),
            image: None,
            pdf: None,
        }
    }

    /// True when there is neither text nor any attachment to send.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.image.is_none() && self.pdf.is_none()
    }
}
