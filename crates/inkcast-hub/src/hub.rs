//! The broadcast hub.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, warn};
use uuid::Uuid;

use inkcast_core::{Event, EventLog, InkcastError, Result};

/// Identifier assigned to a subscriber on connect.
pub type SubscriberId = String;

/// Latest-frame slot of a subscriber. Frames are pre-serialised JSON text;
/// a frame the subscriber has not read yet is replaced by the next one.
pub type SubscriberTx = watch::Sender<Arc<str>>;

/// Reading half of a subscriber slot.
pub type SubscriberRx = watch::Receiver<Arc<str>>;

/// Create a subscriber slot. The initial value is marked as seen, so the
/// reader only wakes for frames the hub sends.
pub fn subscriber_channel() -> (SubscriberTx, SubscriberRx) {
    watch::channel(Arc::from(""))
}

/// Owns the event log and the subscriber set.
///
/// Log mutation and fan-out share one critical section, so every subscriber
/// observes log states in the order the hub produced them. A slow subscriber
/// skips intermediate states instead of buffering them.
pub struct Hub {
    inner: Mutex<HubInner>,
}

#[derive(Default)]
struct HubInner {
    log: EventLog,
    subscribers: HashMap<SubscriberId, SubscriberTx>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HubInner::default()),
        }
    }

    /// Register a subscriber and replay the current log to it if non-empty.
    pub async fn on_connect(&self, tx: SubscriberTx) -> SubscriberId {
        let id = Uuid::new_v4().to_string();
        let mut inner = self.inner.lock().await;

        if !inner.log.is_empty() {
            let frame = match inner.log.to_wire() {
                Ok(frame) => frame,
                Err(e) => {
                    error!(conn_id = %id, %e, "Failed to serialize replay");
                    inner.subscribers.insert(id.clone(), tx);
                    return id;
                }
            };
            if tx.send(Arc::from(frame)).is_err() {
                debug!(conn_id = %id, "Subscriber closed before replay");
                return id;
            }
            debug!(conn_id = %id, records = inner.log.len(), "Replayed log");
        }

        inner.subscribers.insert(id.clone(), tx);
        debug!(conn_id = %id, subscribers = inner.subscribers.len(), "Subscriber registered");
        id
    }

    /// Handle raw message text from a subscriber.
    ///
    /// Malformed input leaves the log untouched and is returned as
    /// [`InkcastError::MalformedEvent`]; the caller keeps the connection open.
    pub async fn on_message(&self, id: &str, raw: &str) -> Result<()> {
        let event = match Event::parse(raw) {
            Ok(event) => event,
            Err(e) => {
                warn!(conn_id = %id, %e, "Dropping malformed event");
                #[cfg(feature = "metrics")]
                crate::metrics::record_malformed();
                return Err(e);
            }
        };
        debug!(conn_id = %id, kind = event.kind(), "Event received");
        self.publish(event).await;
        Ok(())
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub async fn on_disconnect(&self, id: &str) {
        let mut inner = self.inner.lock().await;
        if inner.subscribers.remove(id).is_some() {
            debug!(conn_id = %id, subscribers = inner.subscribers.len(), "Subscriber removed");
        }
    }

    /// Apply an event to the log and broadcast the result.
    /// Returns the number of subscribers the new log was delivered to.
    pub async fn publish(&self, event: Event) -> usize {
        #[cfg(feature = "metrics")]
        crate::metrics::record_event(event.kind());

        let mut inner = self.inner.lock().await;
        inner.log.apply(event);
        inner.broadcast()
    }

    /// Copy of the current log.
    pub async fn snapshot(&self) -> Vec<Value> {
        self.inner.lock().await.log.records().to_vec()
    }

    pub async fn log_len(&self) -> usize {
        self.inner.lock().await.log.len()
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.lock().await.subscribers.len()
    }
}

impl HubInner {
    /// Hand the full log to every subscriber, pruning closed slots.
    fn broadcast(&mut self) -> usize {
        let frame: Arc<str> = match self.log.to_wire() {
            Ok(frame) => Arc::from(frame),
            Err(e) => {
                error!(%e, "Failed to serialize event log");
                return 0;
            }
        };

        self.subscribers.retain(|id, tx| match tx.send(frame.clone()) {
            Ok(()) => true,
            Err(_) => {
                let e = InkcastError::TransportSend(format!("slot for {id} is closed"));
                debug!(conn_id = %id, %e, "Pruning subscriber");
                false
            }
        });

        let sent = self.subscribers.len();
        debug!(sent, records = self.log.len(), "Broadcast log");
        #[cfg(feature = "metrics")]
        crate::metrics::record_broadcast(sent, self.log.len());
        sent
    }
}
