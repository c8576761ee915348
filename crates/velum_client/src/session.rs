//! Two-party chat session.
//!
//! Composes the vault, key service, directory and transport into the
//! flows a host UI drives: sign in, send, read, history, sign out.
//! Everything here is strict about the encryption boundary: plaintext
//! reaches the transport only as OAEP ciphertext, and the private key is
//! only touched through the vault.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use velum_crypto::{oaep, CryptoError, PublicKeyDoc};
use velum_proto::{MessageRecord, OutgoingMessage, SendMessageRequest, ViewerRole};
use velum_store::{FileKeyStore, KeyStore, MemoryKeyStore, Vault};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::http::{HttpDirectory, HttpTransport};
use crate::keyservice::KeyService;
use crate::messaging;
use crate::remote::{Directory, Transport};

/// One decrypt-attempted history record.
pub struct HistoryEntry {
    pub record: MessageRecord,
    /// The readable body; `Ok("")` for attachment-only records. Failures
    /// stay per-entry so one unreadable record never hides the rest.
    pub text: Result<String, ClientError>,
}

pub struct ChatSession {
    directory: Arc<dyn Directory>,
    transport: Arc<dyn Transport>,
    vault: Vault,
    keys: KeyService,
    user_id: RwLock<Option<String>>,
    /// Plaintext of messages sent this session, keyed by record ID, so
    /// the sender's own messages rerender without RSA work.
    sent_cache: RwLock<HashMap<String, String>>,
}

impl ChatSession {
    pub fn new(
        directory: Arc<dyn Directory>,
        transport: Arc<dyn Transport>,
        store: Arc<dyn KeyStore>,
    ) -> Self {
        let vault = Vault::new(store);
        Self {
            directory,
            transport,
            keys: KeyService::new(vault.clone()),
            vault,
            user_id: RwLock::new(None),
            sent_cache: RwLock::new(HashMap::new()),
        }
    }

    /// Session over the hosted HTTP services, with the store `config`
    /// points at.
    pub fn over_http(config: &ClientConfig) -> Result<Self, ClientError> {
        let store: Arc<dyn KeyStore> = match &config.store_path {
            Some(path) => Arc::new(FileKeyStore::open(path)?),
            None => Arc::new(MemoryKeyStore::new()),
        };
        Ok(Self::new(
            Arc::new(HttpDirectory::new(config)),
            Arc::new(HttpTransport::new(config)),
            store,
        ))
    }

    /// Ensure keys exist, unlock the vault and bind the session to
    /// `user_id`. The first sign-in on a store generates and seals a key
    /// pair; later sign-ins unseal the stored one, so a wrong passphrase
    /// fails here with a `Decryption` error.
    pub async fn sign_in(
        &self,
        user_id: &str,
        identity: &str,
        passphrase: &str,
    ) -> Result<PublicKeyDoc, ClientError> {
        let public = self.keys.generate_key_pair(identity, passphrase).await?;
        self.vault.unlock(passphrase).await?;
        *self.user_id.write().await = Some(user_id.to_string());
        tracing::info!(target: "velum", event = "session_started", user_id = %user_id);
        Ok(public)
    }

    pub async fn user_id(&self) -> Option<String> {
        self.user_id.read().await.clone()
    }

    /// The vault backing this session.
    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    async fn require_user(&self) -> Result<String, ClientError> {
        self.user_id
            .read()
            .await
            .clone()
            .ok_or(ClientError::NotSignedIn)
    }

    /// Encrypt (when there is text) and submit one message.
    ///
    /// Text is encrypted for both parties before anything touches the
    /// transport; attachment-only messages skip encryption entirely and
    /// need no key material on either side. An empty draft is refused.
    pub async fn send_message(
        &self,
        receiver_id: &str,
        outgoing: OutgoingMessage,
    ) -> Result<MessageRecord, ClientError> {
        let sender_id = self.require_user().await?;
        if outgoing.is_empty() {
            return Err(CryptoError::InvalidInput("message is empty".into()).into());
        }

        let ciphertexts = if outgoing.text.is_empty() {
            None
        } else {
            let receiver = self.directory.fetch_user(receiver_id).await?;
            let receiver_key = receiver
                .public_key
                .ok_or_else(|| ClientError::MissingPublicKey(receiver_id.to_string()))?;
            let sender_key = self.vault.public_key()?;
            Some(oaep::encrypt_dual(&outgoing.text, &receiver_key, &sender_key)?)
        };
        let (encrypted_for_sender, encrypted_for_receiver) = match ciphertexts {
            Some(dual) => (Some(dual.for_sender), Some(dual.for_receiver)),
            None => (None, None),
        };

        let record = self
            .transport
            .send(SendMessageRequest {
                sender_id: sender_id.clone(),
                receiver_id: receiver_id.to_string(),
                encrypted_for_sender,
                encrypted_for_receiver,
                image: outgoing.image,
                pdf: outgoing.pdf,
            })
            .await?;

        if !outgoing.text.is_empty() {
            self.sent_cache
                .write()
                .await
                .insert(record.id.clone(), outgoing.text);
        }
        tracing::info!(
            target: "velum",
            event = "message_sent",
            message_id = %record.id,
            receiver_id = %receiver_id,
            has_text = record.has_text()
        );
        Ok(record)
    }

    /// Plaintext body of `record` as seen by the signed-in user.
    ///
    /// Messages sent this session come from the local cache; everything
    /// else selects the ciphertext slot for the viewer's role and
    /// decrypts it. Attachment-only records read as `""` without touching
    /// key material. Never substitutes placeholder text for a failure.
    pub async fn read_message(&self, record: &MessageRecord) -> Result<String, ClientError> {
        let user_id = self.require_user().await?;

        if let Some(text) = self.sent_cache.read().await.get(&record.id) {
            return Ok(text.clone());
        }
        if record.is_attachment_only() {
            return Ok(String::new());
        }
        if !record.has_text() {
            // Neither text nor attachments; nothing a viewer could read.
            return Err(CryptoError::Decryption.into());
        }

        let role = ViewerRole::for_record(record, &user_id);
        let text = self
            .vault
            .with_private(|private| {
                messaging::decrypt_record(record, role, private).map_err(Into::into)
            })
            .await?;
        Ok(text)
    }

    /// Fetch and decrypt the whole conversation with `peer_id`, oldest
    /// first. Per-record failures land in the entry, not the whole call.
    pub async fn fetch_history(&self, peer_id: &str) -> Result<Vec<HistoryEntry>, ClientError> {
        let user_id = self.require_user().await?;
        let records = self.transport.fetch_conversation(&user_id, peer_id).await?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let text = self.read_message(&record).await;
            if let Err(err) = &text {
                tracing::warn!(
                    target: "velum",
                    event = "history_decrypt_failed",
                    message_id = %record.id,
                    error = %err
                );
            }
            entries.push(HistoryEntry { record, text });
        }
        Ok(entries)
    }

    /// Lock and wipe local key material and session state. The next
    /// sign-in on this store provisions a fresh key pair.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        self.vault.clear().await?;
        self.sent_cache.write().await.clear();
        *self.user_id.write().await = None;
        tracing::info!(target: "velum", event = "session_ended");
        Ok(())
    }
}
