//! Hosted service implementations over HTTP.
//!
//! Thin reqwest wrappers around the directory and message endpoints.
//! Error bodies are expected in the `ErrorResponse` shape; anything else
//! degrades to the HTTP status line.

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use velum_proto::{DirectoryUser, ErrorResponse, MessageRecord, SendMessageRequest};

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::remote::{Directory, Transport};

/// `GET {api_base_url}/users` and `GET {api_base_url}/users/{id}`.
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpDirectory {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            bearer_token: config.bearer_token.clone(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ClientError> {
        let mut request = self.client.get(&url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Directory(e.to_string()))?;
        read_json(response, ClientError::Directory).await
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn fetch_user(&self, user_id: &str) -> Result<DirectoryUser, ClientError> {
        self.get_json(format!("{}/users/{}", self.base_url, user_id))
            .await
    }

    async fn list_users(&self) -> Result<Vec<DirectoryUser>, ClientError> {
        self.get_json(format!("{}/users", self.base_url)).await
    }
}

/// `POST {api_base_url}/messages` and `GET {api_base_url}/messages/{peer}`.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.clone(),
            bearer_token: config.bearer_token.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: SendMessageRequest) -> Result<MessageRecord, ClientError> {
        let mut builder = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        read_json(response, ClientError::Transport).await
    }

    async fn fetch_conversation(
        &self,
        _viewer_id: &str,
        peer_id: &str,
    ) -> Result<Vec<MessageRecord>, ClientError> {
        // The server derives the viewer from the bearer token.
        let mut builder = self
            .client
            .get(format!("{}/messages/{}", self.base_url, peer_id));
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        read_json(response, ClientError::Transport).await
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    wrap: fn(String) -> ClientError,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        let detail = match response.json::<ErrorResponse>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        return Err(wrap(detail));
    }
    response.json().await.map_err(|e| wrap(e.to_string()))
}
