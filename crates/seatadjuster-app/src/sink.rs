//! Error reporting for asynchronous failures.
//!
//! Subscription faults and failed request handlers have no caller to return
//! to. They end up in an [`ErrorSink`], tagged with where they came from.

use std::fmt;

use seatadjuster_types::SeatError;
use tracing::error;

/// Origin of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    /// Fault delivered by the telemetry subscription.
    Datapoint,
    /// Fault delivered by a command topic subscription.
    Topic,
    /// A request handler that failed while processing an event.
    Invocation,
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSource::Datapoint => write!(f, "datapoint"),
            ErrorSource::Topic => write!(f, "topic"),
            ErrorSource::Invocation => write!(f, "invocation"),
        }
    }
}

/// Destination for errors raised inside event callbacks. Reports are
/// diagnostic only.
pub trait ErrorSink: Send + Sync {
    fn report(&self, source: ErrorSource, error: &SeatError);
}

/// Default sink: one `error!` event per report.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, source: ErrorSource, error: &SeatError) {
        error!(source = %source, "Error occurred during async invocation: {error}");
    }
}
