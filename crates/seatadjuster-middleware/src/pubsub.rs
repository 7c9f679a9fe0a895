//! The seam between the seat adjuster and whatever transport carries its
//! topics.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use seatadjuster_types::SeatError;

/// Stream of payloads received on one topic. Transport faults that do not
/// end the subscription are delivered in-band as `Err` items.
pub type PayloadStream = BoxStream<'static, Result<String, SeatError>>;

/// Topic-based publish/subscribe of UTF-8 text payloads.
///
/// # Contract
///
/// * `publish` – fire-and-forget delivery. Having no listener on a topic is
///   not an error.
/// * `subscribe` – registers interest in an exact topic name and returns the
///   live payload stream. The stream ends when the transport shuts down.
///
/// Implementations must be safe to share between tasks.
#[async_trait]
pub trait PubSubClient: Send + Sync {
    async fn publish(&self, topic: &str, payload: String) -> Result<(), SeatError>;

    async fn subscribe(&self, topic: &str) -> Result<PayloadStream, SeatError>;
}
