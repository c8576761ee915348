//! Realtime delivery-channel framing.
//!
//! The realtime channel carries type-tagged JSON frames. Decoding is
//! strict: an unknown tag or a malformed body is a `CodecError`, and the
//! consumer decides whether to skip the frame or tear down the channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::MessageRecord;

/// One frame on the realtime channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeliveryEvent {
    /// A full message record, pushed to the receiver the moment the server
    /// stores it. Ciphertexts included; the client decrypts locally.
    NewMessage { message: MessageRecord },
    /// Snapshot of currently-online user IDs.
    Presence { online_user_ids: Vec<String> },
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Malformed delivery frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn encode_event(event: &DeliveryEvent) -> Result<String, CodecError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode_event(raw: &str) -> Result<DeliveryEvent, CodecError> {
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};

    fn sample_record() -> MessageRecord {
        MessageRecord {
            id: "m42".into(),
            sender_id: "alice".into(),
            receiver_id: "bob".into(),
            encrypted_for_sender: Some("c2VuZGVy".into()),
            encrypted_for_receiver: Some("cmVjZWl2ZXI=".into()),
            image: None,
            pdf: None,
            created_at: "2026-01-15T09:30:00Z".parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn new_message_roundtrip() {
        let event = DeliveryEvent::NewMessage {
            message: sample_record(),
        };
        let raw = encode_event(&event).unwrap();
        assert!(raw.contains("\"type\":\"new_message\""));

        match decode_event(&raw).unwrap() {
            DeliveryEvent::NewMessage { message } => assert_eq!(message, sample_record()),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn presence_roundtrip() {
        let event = DeliveryEvent::Presence {
            online_user_ids: vec!["alice".into(), "bob".into()],
        };
        let raw = encode_event(&event).unwrap();
        match decode_event(&raw).unwrap() {
            DeliveryEvent::Presence { online_user_ids } => {
                assert_eq!(online_user_ids, vec!["alice", "bob"]);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_malformed() {
        let raw = r#"{"type":"key_rotated","user_id":"alice"}"#;
        assert!(matches!(
            decode_event(raw),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn truncated_frame_is_malformed() {
        assert!(decode_event(r#"{"type":"new_message","messa"#).is_err());
        assert!(decode_event("").is_err());
    }
}
