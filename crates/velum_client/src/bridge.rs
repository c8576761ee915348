//! Realtime delivery fan-out.
//!
//! `DeliveryBridge` pumps raw frames off the realtime channel, decodes
//! them and hands every new message record to the subscribed handlers.
//! Handlers run on the pump task in subscription order; a handler that
//! blocks stalls delivery for everyone behind it, so keep them short.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use velum_proto::codec::{decode_event, DeliveryEvent};
use velum_proto::MessageRecord;

type Handler = Arc<dyn Fn(MessageRecord) + Send + Sync>;

/// Opaque handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

#[derive(Default)]
pub struct DeliveryBridge {
    handlers: Arc<RwLock<BTreeMap<u64, Handler>>>,
    online: Arc<RwLock<Vec<String>>>,
    next_token: AtomicU64,
    pump: Mutex<Option<AbortHandle>>,
}

impl DeliveryBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to incoming message records. Handlers are invoked in
    /// subscription order for every record the channel delivers.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(MessageRecord) + Send + Sync + 'static,
    {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        self.handlers.write().insert(token, Arc::new(handler));
        SubscriptionToken(token)
    }

    /// Returns whether the token was still subscribed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.handlers.write().remove(&token.0).is_some()
    }

    /// Most recent presence snapshot seen on the channel.
    pub fn online_users(&self) -> Vec<String> {
        self.online.read().clone()
    }

    /// Spawn the pump over `frames`. The returned handle resolves when
    /// the channel closes; `shutdown` aborts it early. Attaching again
    /// replaces the previous pump.
    pub fn attach(&self, frames: mpsc::Receiver<String>) -> JoinHandle<()> {
        let handlers = Arc::clone(&self.handlers);
        let online = Arc::clone(&self.online);
        let handle = tokio::spawn(pump(frames, handlers, online));
        if let Some(previous) = self.pump.lock().replace(handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Stop pumping. Safe to call with no pump attached.
    pub fn shutdown(&self) {
        if let Some(handle) = self.pump.lock().take() {
            handle.abort();
        }
    }
}

impl Drop for DeliveryBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn pump(
    mut frames: mpsc::Receiver<String>,
    handlers: Arc<RwLock<BTreeMap<u64, Handler>>>,
    online: Arc<RwLock<Vec<String>>>,
) {
    while let Some(raw) = frames.recv().await {
        match decode_event(&raw) {
            Ok(DeliveryEvent::NewMessage { message }) => {
                tracing::debug!(
                    target: "velum",
                    event = "message_delivered",
                    message_id = %message.id
                );
                // Snapshot so handlers may subscribe/unsubscribe freely.
                let snapshot: Vec<Handler> = handlers.read().values().cloned().collect();
                for handler in snapshot {
                    handler(message.clone());
                }
            }
            Ok(DeliveryEvent::Presence { online_user_ids }) => {
                *online.write() = online_user_ids;
            }
            Err(err) => {
                // Skip the frame; one bad frame must not stop delivery.
                tracing::warn!(
                    target: "velum",
                    event = "frame_decode_failed",
                    error = %err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use velum_proto::codec::encode_event;

    fn frame(id: &str) -> String {
        encode_event(&DeliveryEvent::NewMessage {
            message: MessageRecord {
                id: id.into(),
                sender_id: "alice".into(),
                receiver_id: "bob".into(),
                encrypted_for_sender: None,
                encrypted_for_receiver: None,
                image: Some("cat.png".into()),
                pdf: None,
                created_at: Utc::now(),
            },
        })
        .unwrap()
    }

    #[tokio::test]
    async fn handlers_run_in_subscription_order() {
        let bridge = DeliveryBridge::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            bridge.subscribe(move |record| log.lock().push(format!("{tag}:{}", record.id)));
        }

        let (tx, rx) = mpsc::channel(8);
        let pump = bridge.attach(rx);
        tx.send(frame("m1")).await.unwrap();
        tx.send(frame("m2")).await.unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first:m1", "second:m1", "third:m1", "first:m2", "second:m2", "third:m2"]
        );
    }

    #[tokio::test]
    async fn unsubscribed_handlers_stop_receiving() {
        let bridge = DeliveryBridge::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let first = {
            let log = Arc::clone(&log);
            bridge.subscribe(move |r| log.lock().push(format!("first:{}", r.id)))
        };
        {
            let log = Arc::clone(&log);
            bridge.subscribe(move |r| log.lock().push(format!("second:{}", r.id)));
        }

        assert!(bridge.unsubscribe(first));
        assert!(!bridge.unsubscribe(first));

        let (tx, rx) = mpsc::channel(8);
        let pump = bridge.attach(rx);
        tx.send(frame("m1")).await.unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(*log.lock(), vec!["second:m1"]);
    }

    #[tokio::test]
    async fn malformed_frames_are_skipped() {
        let bridge = DeliveryBridge::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let log = Arc::clone(&log);
            bridge.subscribe(move |r| log.lock().push(r.id));
        }

        let (tx, rx) = mpsc::channel(8);
        let pump = bridge.attach(rx);
        tx.send("{ not a frame".to_string()).await.unwrap();
        tx.send(frame("m1")).await.unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(*log.lock(), vec!["m1"]);
    }

    #[tokio::test]
    async fn presence_updates_the_snapshot() {
        let bridge = DeliveryBridge::new();
        let (tx, rx) = mpsc::channel(8);
        let pump = bridge.attach(rx);

        let presence = encode_event(&DeliveryEvent::Presence {
            online_user_ids: vec!["alice".into(), "bob".into()],
        })
        .unwrap();
        tx.send(presence).await.unwrap();
        drop(tx);
        pump.await.unwrap();

        assert_eq!(bridge.online_users(), vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn shutdown_aborts_the_pump() {
        let bridge = DeliveryBridge::new();
        let (_tx, rx) = mpsc::channel::<String>(8);
        let pump = bridge.attach(rx);

        bridge.shutdown();
        assert!(pump.await.unwrap_err().is_cancelled());
    }
}
