//! `seatadjuster-middleware` – message bus plumbing.
//!
//! Moves opaque text payloads between topics without caring about their
//! meaning.
//!
//! # Modules
//!
//! - [`pubsub`] – the [`PubSubClient`] trait the seat adjuster talks to.
//! - [`bus`] – in-process, topic-keyed publish/subscribe bus built on Tokio
//!   broadcast channels.
//! - [`mqtt`] – [`MqttPubSub`], a [`PubSubClient`] backed by an MQTT broker.

pub mod bus;
pub mod mqtt;
pub mod pubsub;

pub use bus::{EventBus, TopicReceiver};
pub use mqtt::{MqttConfig, MqttPubSub};
pub use pubsub::{PayloadStream, PubSubClient};
