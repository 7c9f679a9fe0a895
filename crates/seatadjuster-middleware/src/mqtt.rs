//! MQTT transport for the seat adjuster topics.
//!
//! [`MqttPubSub`] owns a `rumqttc` client plus a background task that polls
//! the connection. Every inbound publish is pushed through an in-process
//! [`EventBus`] so any number of local subscriptions can share one broker
//! subscription per topic.
//!
//! Connection errors are logged and polling resumes after a short pause;
//! `rumqttc` reconnects on the next poll. Every topic subscribed so far is
//! subscribed again whenever the broker accepts a connection without a
//! stored session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use seatadjuster_types::{BusMessage, SeatError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bus::EventBus;
use crate::pubsub::{PayloadStream, PubSubClient};

/// Pause between polls after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_millis(250);

/// Broker connection settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive_secs: u64,
    /// Capacity of the client request queue and of each local topic channel.
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            client_id: "SeatAdjusterApp".to_string(),
            keep_alive_secs: 30,
            channel_capacity: 64,
        }
    }
}

/// [`PubSubClient`] backed by an MQTT broker.
pub struct MqttPubSub {
    client: AsyncClient,
    inbound: EventBus,
    topics: Arc<Mutex<Vec<String>>>,
    event_task: JoinHandle<()>,
}

impl MqttPubSub {
    /// Create the client and start polling the broker connection.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(config: &MqttConfig) -> Self {
        let mut opts = MqttOptions::new(&config.client_id, &config.host, config.port);
        opts.set_keep_alive(Duration::from_secs(config.keep_alive_secs));

        let (client, event_loop) = AsyncClient::new(opts, config.channel_capacity);
        let inbound = EventBus::new(config.channel_capacity);
        let topics = Arc::new(Mutex::new(Vec::new()));
        let event_task = tokio::spawn(poll_loop(
            event_loop,
            client.clone(),
            Arc::clone(&topics),
            inbound.clone(),
        ));

        info!(host = %config.host, port = config.port, client_id = %config.client_id, "MQTT client started");
        Self {
            client,
            inbound,
            topics,
            event_task,
        }
    }

    /// Broker topics this client has subscribed to, in subscription order.
    pub fn subscribed_topics(&self) -> Vec<String> {
        self.topics.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn remember(&self, topic: &str) {
        let mut topics = self.topics.lock().unwrap_or_else(|e| e.into_inner());
        if !topics.iter().any(|t| t == topic) {
            topics.push(topic.to_string());
        }
    }
}

impl Drop for MqttPubSub {
    fn drop(&mut self) {
        self.event_task.abort();
    }
}

/// Queue a SUBSCRIBE for every remembered topic. Returns how many were queued.
///
/// Uses the non-blocking client call: this runs on the task that drains the
/// request queue, so awaiting queue space here could never complete.
fn resubscribe(client: &AsyncClient, topics: &Mutex<Vec<String>>) -> usize {
    let topics = topics.lock().unwrap_or_else(|e| e.into_inner()).clone();
    let mut queued = 0;
    for topic in topics {
        match client.try_subscribe(topic.as_str(), QoS::AtLeastOnce) {
            Ok(()) => queued += 1,
            Err(e) => warn!(%topic, error = %e, "MQTT resubscribe failed"),
        }
    }
    queued
}

async fn poll_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    topics: Arc<Mutex<Vec<String>>>,
    inbound: EventBus,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                info!(session_present = ack.session_present, "MQTT connected");
                if !ack.session_present {
                    let queued = resubscribe(&client, &topics);
                    if queued > 0 {
                        debug!(topics = queued, "MQTT subscriptions restored");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Publish(p))) => match String::from_utf8(p.payload.to_vec()) {
                Ok(text) => {
                    let message = BusMessage::new(p.topic.clone(), text);
                    debug!(
                        topic = %p.topic,
                        message_id = %message.id,
                        received_at = %message.timestamp,
                        "MQTT publish received"
                    );
                    if let Err(e) = inbound.publish(message) {
                        debug!(topic = %p.topic, error = %e, "dropping publish without local subscribers");
                    }
                }
                Err(e) => warn!(topic = %p.topic, error = %e, "dropping non UTF-8 payload"),
            },
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT poll error: {e}");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

#[async_trait]
impl PubSubClient for MqttPubSub {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), SeatError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, false, payload.into_bytes())
            .await
            .map_err(|e| SeatError::Channel(format!("MQTT publish to {topic} failed: {e}")))
    }

    async fn subscribe(&self, topic: &str) -> Result<PayloadStream, SeatError> {
        // Register locally first so nothing arriving right after the broker
        // SUBACK is missed.
        let local = PubSubClient::subscribe(&self.inbound, topic).await?;
        self.remember(topic);
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|e| SeatError::Channel(format!("MQTT subscribe to {topic} failed: {e}")))?;
        Ok(local)
    }
}
