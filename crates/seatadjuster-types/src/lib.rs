use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Vehicle signals the seat adjuster reads, writes, or subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalId {
    /// Vehicle speed. Read-only.
    Speed,
    /// Driver seat position in row 1. Readable and settable.
    SeatPosition,
}

impl SignalId {
    /// Fully qualified signal path as published by the vehicle data broker.
    pub fn path(&self) -> &'static str {
        match self {
            SignalId::Speed => "Vehicle.Speed",
            SignalId::SeatPosition => "Vehicle.Cabin.Seat.Row1.DriverSide.Position",
        }
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_MAX_EXCLUSIVE_F64: f64 = i64::MAX as f64;

/// A numeric signal value. Speed is a float on the broker, seat position an
/// integer, so both shapes are carried.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Int(i64),
    Float(f64),
}

impl SignalValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            SignalValue::Int(v) => v as f64,
            SignalValue::Float(v) => v,
        }
    }

    /// Integral view of the value. Floats only convert when they carry no
    /// fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            SignalValue::Int(v) => Some(v),
            SignalValue::Float(v)
                if v.fract() == 0.0 && v >= I64_MIN_F64 && v < I64_MAX_EXCLUSIVE_F64 =>
            {
                Some(v as i64)
            }
            SignalValue::Float(_) => None,
        }
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalValue::Int(v) => write!(f, "{v}"),
            SignalValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for SignalValue {
    fn from(v: i64) -> Self {
        SignalValue::Int(v)
    }
}

impl From<f64> for SignalValue {
    fn from(v: f64) -> Self {
        SignalValue::Float(v)
    }
}

/// One update delivered by a telemetry subscription.
///
/// `value` is `None` when the broker reports the signal without a current
/// value (e.g. the seat ECU has not published yet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub signal: SignalId,
    pub value: Option<SignalValue>,
    pub timestamp: DateTime<Utc>,
}

impl DataPoint {
    pub fn new(signal: SignalId, value: impl Into<SignalValue>) -> Self {
        Self {
            signal,
            value: Some(value.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn empty(signal: SignalId) -> Self {
        Self {
            signal,
            value: None,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome code carried in every response and broadcast payload.
/// Encoded on the wire as `0` (OK) or `1` (FAIL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
    Ok,
    Fail,
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        match status {
            Status::Ok => 0,
            Status::Fail => 1,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Status::Ok),
            1 => Ok(Status::Fail),
            other => Err(format!("unknown status code {other}")),
        }
    }
}

/// Inbound `setPosition` command: `{"requestId": 1, "position": 1}`.
///
/// `requestId` is optional; an absent or `null` id is echoed back as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    #[serde(default)]
    pub request_id: Option<i64>,
    pub position: i64,
}

/// Answer to a decoded [`PositionRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionResponse {
    pub request_id: Option<i64>,
    pub result: RequestResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResult {
    pub status: Status,
    pub message: String,
}

impl PositionResponse {
    pub fn ok(request_id: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            request_id,
            result: RequestResult {
                status: Status::Ok,
                message: message.into(),
            },
        }
    }

    pub fn fail(request_id: Option<i64>, message: impl Into<String>) -> Self {
        Self {
            request_id,
            result: RequestResult {
                status: Status::Fail,
                message: message.into(),
            },
        }
    }
}

/// Flat answer sent when a request carries no `position` field.
///
/// `request_id` is forwarded untouched, whatever JSON it was (`null` when
/// the field is absent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRequest {
    pub request_id: serde_json::Value,
    pub status: Status,
    pub message: String,
}

/// Broadcast payload on the current-position topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurrentPosition {
    Position { position: i64 },
    Unavailable { status: Status, message: String },
}

/// A text payload travelling over the message bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusMessage {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub payload: String,
}

impl BusMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}

/// Global error type spanning payload decoding, telemetry access, and
/// transport failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeatError {
    #[error("Decode Error: {0}")]
    Decode(String),

    #[error("Telemetry Failure on {signal}: {details}")]
    Telemetry { signal: SignalId, details: String },

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Serialization Error: {0}")]
    Serialization(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}
