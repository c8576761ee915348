//! velum_client — Velum Messenger client core
//!
//! Ties the crypto, protocol and storage crates into the flows a host UI
//! drives. The hosted services sit behind the `Directory` and `Transport`
//! traits so tests and offline hosts can swap them out.
//!
//! # Module layout
//! - `session`    — sign-in / send / read / history / sign-out flow
//! - `keyservice` — idempotent key-pair provisioning
//! - `messaging`  — record decryption
//! - `bridge`     — realtime delivery fan-out
//! - `remote`     — service traits
//! - `http`       — hosted service implementations (reqwest)
//! - `loopback`   — in-process implementations for tests and offline use
//! - `config`     — connection and storage settings
//! - `error`      — client error type

pub mod bridge;
pub mod config;
pub mod error;
pub mod http;
pub mod keyservice;
pub mod loopback;
pub mod messaging;
pub mod remote;
pub mod session;

pub use bridge::{DeliveryBridge, SubscriptionToken};
pub use config::ClientConfig;
pub use error::ClientError;
pub use keyservice::KeyService;
pub use remote::{Directory, Transport};
pub use session::{ChatSession, HistoryEntry};
