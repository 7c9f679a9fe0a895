//! `seatadjuster-app` – the seat adjuster vehicle application.
//!
//! Listens for `setPosition` requests on the message bus, moves the driver
//! seat when the vehicle is standing still, answers every decoded request on
//! the response topic, and mirrors live seat position changes to a broadcast
//! topic.
//!
//! # Modules
//!
//! - [`app`] – [`SeatAdjusterApp`]: subscription wiring and task spawning.
//! - [`request`] – [`RequestHandler`]: decode, validate, actuate, respond.
//! - [`mirror`] – [`PositionMirror`]: seat position broadcast.
//! - [`precondition`] – the standstill interlock gating every seat move.
//! - [`sink`] – [`ErrorSink`]: where asynchronous failures are reported.
//! - [`topics`] – [`Topics`]: bus topic names.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing].

pub mod app;
pub mod mirror;
pub mod precondition;
pub mod request;
pub mod sink;
pub mod telemetry;
pub mod topics;

pub use app::SeatAdjusterApp;
pub use mirror::PositionMirror;
pub use request::RequestHandler;
pub use sink::{ErrorSink, ErrorSource, LogErrorSink};
pub use telemetry::{init_tracing, TracingGuard};
pub use topics::Topics;
