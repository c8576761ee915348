//! In-process directory and transport.
//!
//! Backs integration tests and offline development. Messages are stored
//! in memory, IDs and timestamps are assigned the way the hosted
//! transport assigns them, and delivery frames are pushed to attached
//! outboxes exactly like the realtime channel would push them.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use uuid::Uuid;

use velum_proto::codec::{encode_event, DeliveryEvent};
use velum_proto::{DirectoryUser, MessageRecord, SendMessageRequest};

use crate::error::ClientError;
use crate::remote::{Directory, Transport};

#[derive(Default)]
pub struct LoopbackDirectory {
    users: RwLock<HashMap<String, DirectoryUser>>,
}

impl LoopbackDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, user: DirectoryUser) {
        self.users.write().insert(user.id.clone(), user);
    }
}

#[async_trait]
impl Directory for LoopbackDirectory {
    async fn fetch_user(&self, user_id: &str) -> Result<DirectoryUser, ClientError> {
        self.users
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| ClientError::Directory(format!("unknown user {user_id}")))
    }

    async fn list_users(&self) -> Result<Vec<DirectoryUser>, ClientError> {
        let mut users: Vec<_> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}

#[derive(Default)]
pub struct LoopbackTransport {
    records: Mutex<Vec<MessageRecord>>,
    outboxes: Mutex<HashMap<String, mpsc::Sender<String>>>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the realtime outbox for `user_id`. Frames for records
    /// addressed to that user are pushed there as they are stored.
    pub fn attach_outbox(&self, user_id: &str, outbox: mpsc::Sender<String>) {
        self.outboxes.lock().insert(user_id.to_string(), outbox);
    }
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&self, request: SendMessageRequest) -> Result<MessageRecord, ClientError> {
        let record = MessageRecord {
            id: Uuid::new_v4().to_string(),
            sender_id: request.sender_id,
            receiver_id: request.receiver_id,
            encrypted_for_sender: request.encrypted_for_sender,
            encrypted_for_receiver: request.encrypted_for_receiver,
            image: request.image,
            pdf: request.pdf,
            created_at: Utc::now(),
        };
        self.records.lock().push(record.clone());

        // Clone the sender out of the lock before awaiting on it.
        let outbox = self.outboxes.lock().get(&record.receiver_id).cloned();
        if let Some(outbox) = outbox {
            let frame = encode_event(&DeliveryEvent::NewMessage {
                message: record.clone(),
            })
            .map_err(|e| ClientError::Transport(e.to_string()))?;
            if outbox.send(frame).await.is_err() {
                // Receiver went away; delivery is best-effort, the send
                // itself already succeeded.
                self.outboxes.lock().remove(&record.receiver_id);
            }
        }
        Ok(record)
    }

    async fn fetch_conversation(
        &self,
        viewer_id: &str,
        peer_id: &str,
    ) -> Result<Vec<MessageRecord>, ClientError> {
        let records = self.records.lock();
        Ok(records
            .iter()
            .filter(|r| {
                (r.sender_id == viewer_id && r.receiver_id == peer_id)
                    || (r.sender_id == peer_id && r.receiver_id == viewer_id)
            })
            .cloned()
            .collect())
    }
}
