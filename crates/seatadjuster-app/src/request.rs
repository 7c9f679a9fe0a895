//! [`RequestHandler`] – answers `setPosition` requests.
//!
//! For every inbound payload the handler:
//!
//! 1. decodes it as a JSON object,
//! 2. answers `"No position specified"` when the `position` field is absent,
//! 3. reads `position` as an integer and `requestId` as an optional integer
//!    (absent or `null` is echoed back as `null`),
//! 4. fetches a fresh vehicle speed,
//! 5. moves the seat only when the [standstill interlock][crate::precondition]
//!    permits it,
//! 6. publishes exactly one response carrying the original `requestId`.
//!
//! Decode and telemetry failures are returned as errors and no response is
//! published; the caller reports them to its [`ErrorSink`][crate::ErrorSink].

use std::sync::Arc;

use seatadjuster_hal::VehicleDataGateway;
use seatadjuster_middleware::PubSubClient;
use seatadjuster_types::{
    PositionRequest, PositionResponse, RejectedRequest, SeatError, SignalId, SignalValue, Status,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::precondition::{self, MoveDecision};

const FIELD_REQUEST_ID: &str = "requestId";
const FIELD_POSITION: &str = "position";

pub const MSG_NO_POSITION: &str = "No position specified";

pub struct RequestHandler {
    gateway: Arc<dyn VehicleDataGateway>,
    bus: Arc<dyn PubSubClient>,
    response_topic: String,
}

impl RequestHandler {
    pub fn new(
        gateway: Arc<dyn VehicleDataGateway>,
        bus: Arc<dyn PubSubClient>,
        response_topic: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            bus,
            response_topic: response_topic.into(),
        }
    }

    /// Handle one payload received on a request topic.
    ///
    /// # Errors
    ///
    /// - [`SeatError::Decode`] – the payload is not a JSON object, or
    ///   `position` is not an integer, or `requestId` is present but not an
    ///   integer.
    /// - [`SeatError::Telemetry`] – the speed read or the seat write failed.
    /// - [`SeatError::Channel`] – the response could not be published.
    pub async fn handle_set_position_request(&self, payload: &str) -> Result<(), SeatError> {
        debug!(payload, "position request");

        let json: Value = serde_json::from_str(payload)
            .map_err(|e| SeatError::Decode(format!("request payload is not valid JSON: {e}")))?;
        let Some(fields) = json.as_object() else {
            return Err(SeatError::Decode(
                "request payload is not a JSON object".to_string(),
            ));
        };

        if !fields.contains_key(FIELD_POSITION) {
            error!("{MSG_NO_POSITION}");
            let rejected = RejectedRequest {
                request_id: fields.get(FIELD_REQUEST_ID).cloned().unwrap_or(Value::Null),
                status: Status::Fail,
                message: MSG_NO_POSITION.to_string(),
            };
            return self.publish_response(&rejected).await;
        }

        let request: PositionRequest = serde_json::from_value(json)
            .map_err(|e| SeatError::Decode(format!("invalid position request: {e}")))?;
        let response = self.process(request).await?;
        self.publish_response(&response).await
    }

    async fn process(&self, request: PositionRequest) -> Result<PositionResponse, SeatError> {
        let speed = self.gateway.read(SignalId::Speed).await?;

        match precondition::evaluate(speed) {
            MoveDecision::Permitted => {
                self.gateway
                    .write(SignalId::SeatPosition, SignalValue::Int(request.position))
                    .await?;
                Ok(PositionResponse::ok(
                    request.request_id,
                    format!("Set Seat position to: {}", request.position),
                ))
            }
            MoveDecision::Blocked { speed } => {
                let message = precondition::blocked_message(speed);
                info!(request_id = ?request.request_id, "{message}");
                Ok(PositionResponse::fail(request.request_id, message))
            }
        }
    }

    async fn publish_response<T: Serialize>(&self, response: &T) -> Result<(), SeatError> {
        let payload = serde_json::to_string(response)
            .map_err(|e| SeatError::Serialization(format!("failed to encode response: {e}")))?;
        self.bus.publish(&self.response_topic, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use seatadjuster_hal::SimGateway;
    use seatadjuster_middleware::{EventBus, PayloadStream};
    use std::time::Duration;

    const RESPONSE: &str = "test/response";

    async fn fixture(speed: f64) -> (RequestHandler, SimGateway, PayloadStream) {
        let gateway = SimGateway::builder().with_speed(speed).with_seat_position(0).build();
        let bus = EventBus::default();
        let responses = PubSubClient::subscribe(&bus, RESPONSE).await.expect("subscribe");
        let handler = RequestHandler::new(Arc::new(gateway.clone()), Arc::new(bus), RESPONSE);
        (handler, gateway, responses)
    }

    async fn next_json(responses: &mut PayloadStream) -> Value {
        let payload = tokio::time::timeout(Duration::from_secs(1), responses.next())
            .await
            .expect("response expected")
            .expect("stream open")
            .expect("payload");
        serde_json::from_str(&payload).expect("response is JSON")
    }

    async fn assert_silent(responses: &mut PayloadStream) {
        let pending = tokio::time::timeout(Duration::from_millis(50), responses.next()).await;
        assert!(pending.is_err(), "no response must be published");
    }

    #[tokio::test]
    async fn standstill_moves_seat_and_answers_ok() {
        let (handler, gateway, mut responses) = fixture(0.0).await;

        handler
            .handle_set_position_request(r#"{"requestId":7,"position":3}"#)
            .await
            .expect("handled");

        assert_eq!(gateway.read_count(), 1);
        assert_eq!(gateway.writes(), vec![(SignalId::SeatPosition, SignalValue::Int(3))]);
        let payload = tokio::time::timeout(Duration::from_secs(1), responses.next())
            .await
            .expect("response expected")
            .expect("stream open")
            .expect("payload");
        assert_eq!(
            payload,
            r#"{"requestId":7,"result":{"status":0,"message":"Set Seat position to: 3"}}"#
        );
    }

    #[tokio::test]
    async fn moving_vehicle_blocks_seat() {
        let (handler, gateway, mut responses) = fixture(15.0).await;

        handler
            .handle_set_position_request(r#"{"requestId":8,"position":3}"#)
            .await
            .expect("handled");

        assert!(gateway.writes().is_empty());
        let payload = responses.next().await.expect("stream open").expect("payload");
        assert_eq!(
            payload,
            r#"{"requestId":8,"result":{"status":1,"message":"Not allowed to move seat because vehicle speed is 15 and not 0"}}"#
        );
    }

    #[tokio::test]
    async fn negative_speed_blocks_seat() {
        let (handler, gateway, mut responses) = fixture(-4.0).await;

        handler
            .handle_set_position_request(r#"{"requestId":1,"position":10}"#)
            .await
            .expect("handled");

        assert!(gateway.writes().is_empty());
        let json = next_json(&mut responses).await;
        assert_eq!(json["result"]["status"], 1);
        assert!(json["result"]["message"].as_str().unwrap().contains("-4"));
    }

    #[tokio::test]
    async fn missing_position_answers_fail_without_telemetry() {
        let (handler, gateway, mut responses) = fixture(0.0).await;

        handler
            .handle_set_position_request(r#"{"requestId":5}"#)
            .await
            .expect("handled");

        assert_eq!(gateway.read_count(), 0);
        assert!(gateway.writes().is_empty());
        let json = next_json(&mut responses).await;
        assert_eq!(json, serde_json::json!({"requestId": 5, "status": 1, "message": "No position specified"}));
    }

    #[tokio::test]
    async fn missing_position_and_request_id_forwards_null() {
        let (handler, _gateway, mut responses) = fixture(0.0).await;

        handler.handle_set_position_request("{}").await.expect("handled");

        let json = next_json(&mut responses).await;
        assert_eq!(json["requestId"], Value::Null);
        assert_eq!(json["message"], MSG_NO_POSITION);
    }

    #[tokio::test]
    async fn request_id_is_echoed_for_zero_and_negative_ids() {
        let (handler, _gateway, mut responses) = fixture(0.0).await;

        for id in [0_i64, -1, i64::from(i32::MIN), i64::MAX] {
            let payload = serde_json::json!({"requestId": id, "position": 1}).to_string();
            handler.handle_set_position_request(&payload).await.expect("handled");
            let json = next_json(&mut responses).await;
            assert_eq!(json["requestId"], id);
        }
    }

    #[tokio::test]
    async fn absent_request_id_moves_seat_and_answers_null() {
        let (handler, gateway, mut responses) = fixture(0.0).await;

        handler
            .handle_set_position_request(r#"{"position":3}"#)
            .await
            .expect("handled");

        assert_eq!(gateway.writes(), vec![(SignalId::SeatPosition, SignalValue::Int(3))]);
        let payload = responses.next().await.expect("stream open").expect("payload");
        assert_eq!(
            payload,
            r#"{"requestId":null,"result":{"status":0,"message":"Set Seat position to: 3"}}"#
        );
    }

    #[tokio::test]
    async fn null_request_id_is_echoed_as_null() {
        let (handler, gateway, mut responses) = fixture(5.0).await;

        handler
            .handle_set_position_request(r#"{"requestId":null,"position":3}"#)
            .await
            .expect("handled");

        assert!(gateway.writes().is_empty());
        let json = next_json(&mut responses).await;
        assert_eq!(json["requestId"], Value::Null);
        assert_eq!(json["result"]["status"], 1);
    }

    #[tokio::test]
    async fn string_request_id_is_a_decode_error() {
        let (handler, gateway, mut responses) = fixture(0.0).await;

        let result = handler
            .handle_set_position_request(r#"{"requestId":"x","position":3}"#)
            .await;

        assert!(matches!(result, Err(SeatError::Decode(_))));
        assert_eq!(gateway.read_count(), 0);
        assert!(gateway.writes().is_empty());
        assert_silent(&mut responses).await;
    }

    #[tokio::test]
    async fn null_position_is_a_decode_error() {
        let (handler, gateway, mut responses) = fixture(0.0).await;

        let result = handler
            .handle_set_position_request(r#"{"requestId":4,"position":null}"#)
            .await;

        assert!(matches!(result, Err(SeatError::Decode(_))));
        assert!(gateway.writes().is_empty());
        assert_silent(&mut responses).await;
    }

    #[tokio::test]
    async fn creeping_speed_blocks_seat() {
        let (handler, gateway, mut responses) = fixture(0.0001).await;

        handler
            .handle_set_position_request(r#"{"requestId":2,"position":3}"#)
            .await
            .expect("handled");

        assert!(gateway.writes().is_empty());
        let json = next_json(&mut responses).await;
        assert_eq!(json["requestId"], 2);
        assert_eq!(json["result"]["status"], 1);
        assert!(json["result"]["message"].as_str().unwrap().contains("0.0001"));
    }

    #[tokio::test]
    async fn malformed_json_is_dropped_with_error() {
        let (handler, gateway, mut responses) = fixture(0.0).await;

        let result = handler.handle_set_position_request("not json").await;

        assert!(matches!(result, Err(SeatError::Decode(_))));
        assert_eq!(gateway.read_count(), 0);
        assert_silent(&mut responses).await;
    }

    #[tokio::test]
    async fn non_object_payload_is_a_decode_error() {
        let (handler, _gateway, mut responses) = fixture(0.0).await;

        let result = handler.handle_set_position_request("[1, 2]").await;

        assert!(matches!(result, Err(SeatError::Decode(_))));
        assert_silent(&mut responses).await;
    }

    #[tokio::test]
    async fn non_numeric_position_is_a_decode_error() {
        let (handler, gateway, mut responses) = fixture(0.0).await;

        let result = handler
            .handle_set_position_request(r#"{"requestId":3,"position":"forward"}"#)
            .await;

        assert!(matches!(result, Err(SeatError::Decode(_))));
        assert!(gateway.writes().is_empty());
        assert_silent(&mut responses).await;
    }

    #[tokio::test]
    async fn speed_read_failure_drops_request() {
        let (handler, gateway, mut responses) = fixture(0.0).await;
        gateway.fail_reads(Some("databroker unavailable"));

        let result = handler
            .handle_set_position_request(r#"{"requestId":9,"position":3}"#)
            .await;

        assert!(matches!(result, Err(SeatError::Telemetry { signal: SignalId::Speed, .. })));
        assert!(gateway.writes().is_empty());
        assert_silent(&mut responses).await;
    }

    #[tokio::test]
    async fn seat_write_failure_drops_request() {
        let (handler, gateway, mut responses) = fixture(0.0).await;
        gateway.fail_writes(Some("seat motor fault"));

        let result = handler
            .handle_set_position_request(r#"{"requestId":10,"position":3}"#)
            .await;

        assert!(matches!(
            result,
            Err(SeatError::Telemetry { signal: SignalId::SeatPosition, .. })
        ));
        assert_silent(&mut responses).await;
    }
}
