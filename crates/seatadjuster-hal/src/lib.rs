//! `seatadjuster-hal` – access to vehicle signals.
//!
//! - [`gateway`] – the [`VehicleDataGateway`] trait: read, write, and
//!   subscribe to [`SignalId`][seatadjuster_types::SignalId] values.
//! - [`sim`] – [`SimGateway`], an in-process data broker for tests and
//!   local runs without a vehicle.

pub mod gateway;
pub mod sim;

pub use gateway::{DataPointStream, VehicleDataGateway};
pub use sim::{SimGateway, SimGatewayBuilder};
