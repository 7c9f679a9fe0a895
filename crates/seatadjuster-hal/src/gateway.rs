//! Generic access to vehicle signals.
//!
//! Broker clients implement [`VehicleDataGateway`]. The seat adjuster only
//! ever talks to the trait, so the in-process simulation and a real data
//! broker are interchangeable.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use seatadjuster_types::{DataPoint, SeatError, SignalId, SignalValue};

/// Live updates for one signal. Faults that do not end the subscription are
/// delivered in-band as `Err` items.
pub type DataPointStream = BoxStream<'static, Result<DataPoint, SeatError>>;

/// Read/write/subscribe access to vehicle signals.
///
/// Every call is a suspension point: the caller waits until the broker
/// answers, without blocking other tasks. Timeouts belong to the
/// implementation.
#[async_trait]
pub trait VehicleDataGateway: Send + Sync {
    /// Fetch the current value of `signal`.
    ///
    /// # Errors
    ///
    /// Returns [`SeatError::Telemetry`] when the broker cannot be reached or
    /// the signal has no current value.
    async fn read(&self, signal: SignalId) -> Result<SignalValue, SeatError>;

    /// Set `signal` to `value` and wait for the broker to acknowledge.
    ///
    /// # Errors
    ///
    /// Returns [`SeatError::Telemetry`] when the signal is read-only or the
    /// broker rejects the write.
    async fn write(&self, signal: SignalId, value: SignalValue) -> Result<(), SeatError>;

    /// Subscribe to every future change of `signal`.
    async fn subscribe(&self, signal: SignalId) -> Result<DataPointStream, SeatError>;
}
