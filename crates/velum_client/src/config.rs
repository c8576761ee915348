//! Client configuration.

use std::path::PathBuf;

/// Connection and storage settings for a client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the HTTP API, without a trailing slash.
    pub api_base_url: String,
    /// Bearer token for authenticated endpoints, when the deployment
    /// requires one.
    pub bearer_token: Option<String>,
    /// Location of the file-backed key store. `None` keeps key material
    /// in memory for the lifetime of the process.
    pub store_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001/api".into(),
            bearer_token: None,
            store_path: None,
        }
    }
}
