//! [`PositionMirror`] – republishes seat position changes.
//!
//! Every telemetry update for the driver seat becomes one payload on the
//! current-position topic: `{"position": value}` when a value can be
//! extracted, `{"status": 1, "message": ...}` otherwise.

use std::sync::Arc;

use seatadjuster_middleware::PubSubClient;
use seatadjuster_types::{CurrentPosition, DataPoint, SeatError, SignalId, Status};
use tracing::{debug, warn};

pub struct PositionMirror {
    bus: Arc<dyn PubSubClient>,
    topic: String,
}

impl PositionMirror {
    pub fn new(bus: Arc<dyn PubSubClient>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            topic: topic.into(),
        }
    }

    /// Publish the broadcast payload for one update. Never fails: extraction
    /// errors degrade to the FAIL-shaped payload and publish errors are
    /// logged.
    pub async fn handle_seat_position_changed(&self, update: Result<DataPoint, SeatError>) {
        if let Ok(data_point) = &update {
            debug!(
                signal = %data_point.signal,
                sampled_at = %data_point.timestamp,
                "seat position update"
            );
        }
        let current = match current_position(update) {
            Ok(position) => CurrentPosition::Position { position },
            Err(e) => {
                warn!("Unable to get Current Seat Position, Exception: {e}");
                CurrentPosition::Unavailable {
                    status: Status::Fail,
                    message: e.to_string(),
                }
            }
        };

        let payload = match serde_json::to_string(&current) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode current position");
                return;
            }
        };
        if let Err(e) = self.bus.publish(&self.topic, payload).await {
            warn!(topic = %self.topic, error = %e, "failed to publish current position");
        }
    }
}

fn current_position(update: Result<DataPoint, SeatError>) -> Result<i64, SeatError> {
    let data_point = update?;
    let missing = |details: String| SeatError::Telemetry {
        signal: SignalId::SeatPosition,
        details,
    };

    if data_point.signal != SignalId::SeatPosition {
        return Err(missing(format!(
            "{} not present in update for {}",
            SignalId::SeatPosition,
            data_point.signal
        )));
    }
    let value = data_point
        .value
        .ok_or_else(|| missing("update carries no value".to_string()))?;
    value
        .as_i64()
        .ok_or_else(|| missing(format!("value {value} is not an integer position")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use seatadjuster_middleware::{EventBus, PayloadStream};
    use serde_json::Value;

    const TOPIC: &str = "test/currentPosition";

    async fn fixture() -> (PositionMirror, PayloadStream) {
        let bus = EventBus::default();
        let broadcasts = PubSubClient::subscribe(&bus, TOPIC).await.expect("subscribe");
        (PositionMirror::new(Arc::new(bus), TOPIC), broadcasts)
    }

    async fn next_payload(broadcasts: &mut PayloadStream) -> String {
        broadcasts.next().await.expect("stream open").expect("payload")
    }

    #[tokio::test]
    async fn update_is_mirrored() {
        let (mirror, mut broadcasts) = fixture().await;

        mirror
            .handle_seat_position_changed(Ok(DataPoint::new(SignalId::SeatPosition, 42_i64)))
            .await;

        assert_eq!(next_payload(&mut broadcasts).await, r#"{"position":42}"#);
    }

    #[tokio::test]
    async fn empty_update_degrades_to_fail_payload() {
        let (mirror, mut broadcasts) = fixture().await;

        mirror
            .handle_seat_position_changed(Ok(DataPoint::empty(SignalId::SeatPosition)))
            .await;

        let json: Value = serde_json::from_str(&next_payload(&mut broadcasts).await).unwrap();
        assert_eq!(json["status"], 1);
        assert!(!json["message"].as_str().unwrap().is_empty());
        assert!(json.get("position").is_none());
    }

    #[tokio::test]
    async fn error_update_carries_error_text() {
        let (mirror, mut broadcasts) = fixture().await;

        mirror
            .handle_seat_position_changed(Err(SeatError::Telemetry {
                signal: SignalId::SeatPosition,
                details: "sensor offline".to_string(),
            }))
            .await;

        let json: Value = serde_json::from_str(&next_payload(&mut broadcasts).await).unwrap();
        assert_eq!(json["status"], 1);
        assert!(json["message"].as_str().unwrap().contains("sensor offline"));
    }

    #[tokio::test]
    async fn foreign_signal_and_fractional_values_fail() {
        let (mirror, mut broadcasts) = fixture().await;

        mirror
            .handle_seat_position_changed(Ok(DataPoint::new(SignalId::Speed, 3.0_f64)))
            .await;
        mirror
            .handle_seat_position_changed(Ok(DataPoint::new(SignalId::SeatPosition, 2.5_f64)))
            .await;

        for _ in 0..2 {
            let json: Value = serde_json::from_str(&next_payload(&mut broadcasts).await).unwrap();
            assert_eq!(json["status"], 1);
        }
    }
}
