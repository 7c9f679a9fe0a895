//! [`SimGateway`] – in-process vehicle data broker.
//!
//! Holds the current value of every [`SignalId`], records each accepted
//! write, and pushes a [`DataPoint`] to subscribers whenever a value changes.
//! This lets the full seat adjuster run in a unit test or on a developer
//! machine without a vehicle.
//!
//! # Simulated behaviour
//!
//! | Operation | Behaviour |
//! |---|---|
//! | `read`  | Returns the stored value; fails when no value is set or reads are faulted. |
//! | `write` | Rejects read-only signals; otherwise stores, records, and publishes the value. |
//! | `subscribe` | Streams updates for one signal, including injected faults. |
//!
//! # Example
//!
//! ```rust
//! use seatadjuster_hal::{SimGateway, VehicleDataGateway};
//! use seatadjuster_types::{SignalId, SignalValue};
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(async {
//!     let gateway = SimGateway::builder().with_speed(0.0).with_seat_position(10).build();
//!     gateway.write(SignalId::SeatPosition, SignalValue::Int(42)).await.unwrap();
//!     assert_eq!(gateway.read(SignalId::SeatPosition).await.unwrap(), SignalValue::Int(42));
//! });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use seatadjuster_types::{DataPoint, SeatError, SignalId, SignalValue};
use tokio::sync::broadcast;
use tracing::debug;

use crate::gateway::{DataPointStream, VehicleDataGateway};

const UPDATE_CAPACITY: usize = 64;

#[derive(Default)]
struct SimState {
    values: HashMap<SignalId, SignalValue>,
    writes: Vec<(SignalId, SignalValue)>,
    reads: usize,
    read_fault: Option<String>,
    write_fault: Option<String>,
}

/// In-process vehicle data broker. Clones share the same state.
#[derive(Clone)]
pub struct SimGateway {
    state: Arc<Mutex<SimState>>,
    updates: broadcast::Sender<Result<DataPoint, SeatError>>,
}

impl SimGateway {
    pub fn builder() -> SimGatewayBuilder {
        SimGatewayBuilder::default()
    }

    /// Change the vehicle speed and notify subscribers.
    pub fn set_speed(&self, speed: f64) {
        self.store(SignalId::Speed, SignalValue::Float(speed));
    }

    /// Push an arbitrary update to subscribers without touching stored
    /// values.
    pub fn inject(&self, data_point: DataPoint) {
        let _ = self.updates.send(Ok(data_point));
    }

    /// Push a subscription fault for `signal`.
    pub fn inject_error(&self, signal: SignalId, details: impl Into<String>) {
        let _ = self.updates.send(Err(SeatError::Telemetry {
            signal,
            details: details.into(),
        }));
    }

    /// Make every subsequent `read` fail with `details`. `None` clears it.
    pub fn fail_reads(&self, details: Option<&str>) {
        self.lock().read_fault = details.map(str::to_string);
    }

    /// Make every subsequent `write` fail with `details`. `None` clears it.
    pub fn fail_writes(&self, details: Option<&str>) {
        self.lock().write_fault = details.map(str::to_string);
    }

    /// Every accepted write, oldest first.
    pub fn writes(&self) -> Vec<(SignalId, SignalValue)> {
        self.lock().writes.clone()
    }

    /// Number of `read` calls served, failed ones included.
    pub fn read_count(&self) -> usize {
        self.lock().reads
    }

    fn store(&self, signal: SignalId, value: SignalValue) {
        self.lock().values.insert(signal, value);
        let _ = self.updates.send(Ok(DataPoint::new(signal, value)));
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl VehicleDataGateway for SimGateway {
    async fn read(&self, signal: SignalId) -> Result<SignalValue, SeatError> {
        let mut state = self.lock();
        state.reads += 1;
        if let Some(details) = &state.read_fault {
            return Err(SeatError::Telemetry {
                signal,
                details: details.clone(),
            });
        }
        state.values.get(&signal).copied().ok_or_else(|| SeatError::Telemetry {
            signal,
            details: "signal has no current value".to_string(),
        })
    }

    async fn write(&self, signal: SignalId, value: SignalValue) -> Result<(), SeatError> {
        {
            let mut state = self.lock();
            if let Some(details) = &state.write_fault {
                return Err(SeatError::Telemetry {
                    signal,
                    details: details.clone(),
                });
            }
            if signal == SignalId::Speed {
                return Err(SeatError::Telemetry {
                    signal,
                    details: "signal is read-only".to_string(),
                });
            }
            state.writes.push((signal, value));
        }
        debug!(signal = %signal, value = %value, "simulated write accepted");
        self.store(signal, value);
        Ok(())
    }

    async fn subscribe(&self, signal: SignalId) -> Result<DataPointStream, SeatError> {
        let receiver = self.updates.subscribe();
        Ok(stream::unfold(receiver, move |mut rx| async move {
            loop {
                match rx.recv().await {
                    Ok(Ok(dp)) if dp.signal == signal => return Some((Ok(dp), rx)),
                    Ok(Err(SeatError::Telemetry { signal: s, details })) if s == signal => {
                        return Some((Err(SeatError::Telemetry { signal: s, details }), rx));
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        let err = SeatError::Telemetry {
                            signal,
                            details: format!("subscription lagged by {n} updates"),
                        };
                        return Some((Err(err), rx));
                    }
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
        .boxed())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for a [`SimGateway`] with initial signal values.
#[derive(Default)]
pub struct SimGatewayBuilder {
    values: HashMap<SignalId, SignalValue>,
}

impl SimGatewayBuilder {
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.values.insert(SignalId::Speed, SignalValue::Float(speed));
        self
    }

    pub fn with_seat_position(mut self, position: i64) -> Self {
        self.values.insert(SignalId::SeatPosition, SignalValue::Int(position));
        self
    }

    pub fn build(self) -> SimGateway {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        SimGateway {
            state: Arc::new(Mutex::new(SimState {
                values: self.values,
                ..SimState::default()
            })),
            updates,
        }
    }
}
