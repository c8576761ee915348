//! Service boundaries: the user directory and the message transport.
//!
//! The client core only talks to these traits. `http` implements them
//! against the hosted services, `loopback` in-process.

use async_trait::async_trait;

use velum_proto::{DirectoryUser, MessageRecord, SendMessageRequest};

use crate::error::ClientError;

/// Read-only view of the user directory.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn fetch_user(&self, user_id: &str) -> Result<DirectoryUser, ClientError>;
    async fn list_users(&self) -> Result<Vec<DirectoryUser>, ClientError>;
}

/// Message submission and history retrieval.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Store a message. The server assigns `id` and `created_at` and
    /// echoes the stored record back.
    async fn send(&self, request: SendMessageRequest) -> Result<MessageRecord, ClientError>;

    /// Full conversation between `viewer_id` and `peer_id`, oldest first.
    async fn fetch_conversation(
        &self,
        viewer_id: &str,
        peer_id: &str,
    ) -> Result<Vec<MessageRecord>, ClientError>;
}
