//! Headless, topic-keyed publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others. One channel is created lazily per topic name the first time it
//! is published to or subscribed on.
//!
//! The bus serves two roles:
//!
//! * the in-process [`PubSubClient`] used by tests and local runs, and
//! * the fan-out stage behind [`MqttPubSub`][crate::mqtt::MqttPubSub], which
//!   pushes every inbound broker publish through it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use seatadjuster_types::{BusMessage, SeatError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::pubsub::{PayloadStream, PubSubClient};

/// Default channel capacity (number of buffered messages before old ones are
/// dropped for slow subscribers).
const DEFAULT_CAPACITY: usize = 256;

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// topic channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    capacity: usize,
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<BusMessage>>>>,
}

impl EventBus {
    /// Create a new bus with the given per-topic channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            topics: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publish `message` on its own topic.
    ///
    /// Returns the number of active receivers that were handed the message,
    /// or [`SeatError::Channel`] when nobody is listening on the topic.
    pub fn publish(&self, message: BusMessage) -> Result<usize, SeatError> {
        let sender = self.topic_sender(&message.topic);
        let topic = message.topic.clone();
        sender
            .send(message)
            .map_err(|_| SeatError::Channel(format!("No subscribers for topic {topic}")))
    }

    /// Subscribe to a single topic.
    pub fn subscribe_to(&self, topic: &str) -> TopicReceiver {
        TopicReceiver {
            topic: topic.to_string(),
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn topic_sender(&self, topic: &str) -> broadcast::Sender<BusMessage> {
        {
            let topics = self.topics.read().unwrap_or_else(|e| e.into_inner());
            if let Some(sender) = topics.get(topic) {
                return sender.clone();
            }
        }
        let mut topics = self.topics.write().unwrap_or_else(|e| e.into_inner());
        topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl PubSubClient for EventBus {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), SeatError> {
        if let Err(e) = EventBus::publish(self, BusMessage::new(topic, payload)) {
            // Nobody listening is a normal condition for a broadcast topic.
            debug!(topic, error = %e, "message published without subscribers");
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<PayloadStream, SeatError> {
        Ok(self
            .subscribe_to(topic)
            .into_stream()
            .map(|item| item.map(|message| message.payload))
            .boxed())
    }
}

// ---------------------------------------------------------------------------
// Topic receiver
// ---------------------------------------------------------------------------

/// An async receiver bound to a single topic.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: String,
    receiver: broadcast::Receiver<BusMessage>,
}

impl TopicReceiver {
    /// Wait for the next message on this topic.
    ///
    /// Returns:
    /// * `Ok(message)` – a successfully received message.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<BusMessage, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// The topic this receiver is bound to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Turn the receiver into a stream. Lag is reported in-band as
    /// [`SeatError::Channel`]; the stream ends when the bus is dropped.
    pub fn into_stream(self) -> BoxStream<'static, Result<BusMessage, SeatError>> {
        stream::unfold(self, |mut rx| async move {
            match rx.receiver.recv().await {
                Ok(message) => {
                    debug!(
                        topic = %rx.topic,
                        message_id = %message.id,
                        published_at = %message.timestamp,
                        "bus message delivered"
                    );
                    Some((Ok(message), rx))
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = %rx.topic, lagged_by = n, "topic subscriber lagged");
                    let err = SeatError::Channel(format!(
                        "subscriber on {} lagged by {n} messages",
                        rx.topic
                    ));
                    Some((Err(err), rx))
                }
                Err(broadcast::error::RecvError::Closed) => None,
            }
        })
        .boxed()
    }
}
