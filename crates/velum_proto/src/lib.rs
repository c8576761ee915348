//! velum_proto — Velum Messenger protocol types
//!
//! Everything that crosses a process or network boundary lives here:
//!
//! - `message` — message records, viewer roles, outgoing drafts
//! - `api`     — HTTP request/response bodies
//! - `codec`   — realtime delivery-channel framing
//!
//! Key exchange documents are defined in `velum_crypto` and re-used by the
//! API types unchanged.

pub mod api;
pub mod codec;
pub mod message;

pub use api::{DirectoryUser, ErrorResponse, SendMessageRequest};
pub use codec::{decode_event, encode_event, CodecError, DeliveryEvent};
pub use message::{MessageRecord, OutgoingMessage, ViewerRole};
