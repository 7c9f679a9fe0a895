//! [`SeatAdjusterApp`] – subscription wiring.
//!
//! [`SeatAdjusterApp::on_start`] registers:
//!
//! * one telemetry subscription to the driver seat position. Updates go to
//!   the [`PositionMirror`], faults to the [`ErrorSink`] tagged
//!   [`ErrorSource::Datapoint`];
//! * one bus subscription per configured request topic. Payloads go to the
//!   shared [`RequestHandler`], faults to the sink tagged
//!   [`ErrorSource::Topic`].
//!
//! Every request runs in its own Tokio task, so a request waiting on the
//! telemetry gateway never holds up another request or a position update.
//! Position updates are mirrored in arrival order on the subscription task.
//! Handler failures are reported with [`ErrorSource::Invocation`].
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use seatadjuster_app::{SeatAdjusterApp, Topics};
//! use seatadjuster_hal::SimGateway;
//! use seatadjuster_middleware::EventBus;
//!
//! # async fn run() -> Result<(), seatadjuster_types::SeatError> {
//! let gateway = Arc::new(SimGateway::builder().with_speed(0.0).with_seat_position(0).build());
//! let mut app = SeatAdjusterApp::new(gateway, Arc::new(EventBus::default()), Topics::default());
//! app.on_start().await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

use futures_util::StreamExt;
use seatadjuster_hal::{DataPointStream, VehicleDataGateway};
use seatadjuster_middleware::{PayloadStream, PubSubClient};
use seatadjuster_types::{SeatError, SignalId};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::mirror::PositionMirror;
use crate::request::RequestHandler;
use crate::sink::{ErrorSink, ErrorSource, LogErrorSink};
use crate::topics::Topics;

/// What a subscription listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionTarget {
    Datapoint(SignalId),
    Topic(String),
}

impl fmt::Display for SubscriptionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionTarget::Datapoint(signal) => write!(f, "datapoint {signal}"),
            SubscriptionTarget::Topic(topic) => write!(f, "topic {topic}"),
        }
    }
}

struct Subscription {
    target: SubscriptionTarget,
    task: JoinHandle<()>,
}

pub struct SeatAdjusterApp {
    gateway: Arc<dyn VehicleDataGateway>,
    bus: Arc<dyn PubSubClient>,
    topics: Topics,
    sink: Arc<dyn ErrorSink>,
    requests: Arc<RequestHandler>,
    mirror: Arc<PositionMirror>,
    subscriptions: Vec<Subscription>,
}

impl SeatAdjusterApp {
    pub fn new(
        gateway: Arc<dyn VehicleDataGateway>,
        bus: Arc<dyn PubSubClient>,
        topics: Topics,
    ) -> Self {
        let requests = Arc::new(RequestHandler::new(
            Arc::clone(&gateway),
            Arc::clone(&bus),
            topics.response.clone(),
        ));
        let mirror = Arc::new(PositionMirror::new(
            Arc::clone(&bus),
            topics.current_position.clone(),
        ));
        Self {
            gateway,
            bus,
            topics,
            sink: Arc::new(LogErrorSink),
            requests,
            mirror,
            subscriptions: Vec::new(),
        }
    }

    /// Replace the default logging sink.
    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Register every subscription and start dispatching events.
    ///
    /// Calling it again while subscriptions are active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first registration failure. Subscriptions registered
    /// before the failure are torn down again.
    pub async fn on_start(&mut self) -> Result<(), SeatError> {
        if !self.subscriptions.is_empty() {
            warn!("seat adjuster already started");
            return Ok(());
        }

        info!("Subscribe for data points!");
        if let Err(e) = self.register_all().await {
            self.shutdown();
            return Err(e);
        }
        info!(
            subscriptions = self.subscriptions.len(),
            "seat adjuster started"
        );
        Ok(())
    }

    /// Targets whose dispatch task is still running.
    pub fn active_subscriptions(&self) -> Vec<SubscriptionTarget> {
        self.subscriptions
            .iter()
            .filter(|s| !s.task.is_finished())
            .map(|s| s.target.clone())
            .collect()
    }

    /// Stop dispatching. Handlers already spawned run to completion.
    pub fn shutdown(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            debug!(subscription = %subscription.target, "unsubscribing");
            subscription.task.abort();
        }
    }

    async fn register_all(&mut self) -> Result<(), SeatError> {
        let updates = self.gateway.subscribe(SignalId::SeatPosition).await?;
        self.subscriptions.push(Subscription {
            target: SubscriptionTarget::Datapoint(SignalId::SeatPosition),
            task: tokio::spawn(dispatch_datapoints(
                updates,
                Arc::clone(&self.mirror),
                Arc::clone(&self.sink),
            )),
        });

        for topic in self.topics.requests.clone() {
            let payloads = self.bus.subscribe(&topic).await?;
            self.subscriptions.push(Subscription {
                target: SubscriptionTarget::Topic(topic),
                task: tokio::spawn(dispatch_requests(
                    payloads,
                    Arc::clone(&self.requests),
                    Arc::clone(&self.sink),
                )),
            });
        }
        Ok(())
    }
}

impl Drop for SeatAdjusterApp {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn dispatch_datapoints(
    mut updates: DataPointStream,
    mirror: Arc<PositionMirror>,
    sink: Arc<dyn ErrorSink>,
) {
    while let Some(update) = updates.next().await {
        match update {
            Ok(data_point) => mirror.handle_seat_position_changed(Ok(data_point)).await,
            Err(e) => sink.report(ErrorSource::Datapoint, &e),
        }
    }
    debug!("seat position subscription ended");
}

async fn dispatch_requests(
    mut payloads: PayloadStream,
    requests: Arc<RequestHandler>,
    sink: Arc<dyn ErrorSink>,
) {
    while let Some(payload) = payloads.next().await {
        match payload {
            Ok(payload) => {
                let requests = Arc::clone(&requests);
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    if let Err(e) = requests.handle_set_position_request(&payload).await {
                        sink.report(ErrorSource::Invocation, &e);
                    }
                });
            }
            Err(e) => sink.report(ErrorSource::Topic, &e),
        }
    }
    debug!("request topic subscription ended");
}
