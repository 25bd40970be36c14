//! Channel Sink Adapter
//!
//! Implements `PresentationSink` by broadcasting [`ViewEvent`]s so any number
//! of front-ends can follow the session.

use crate::domain::{ClientError, DispatchKey, Snapshot};
use crate::ports::outbound::PresentationSink;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

/// Default broadcast buffer size.
pub const DEFAULT_VIEW_CAPACITY: usize = 64;

/// Something a front-end should render.
#[derive(Clone, Debug)]
pub enum ViewEvent {
    /// A sync completed.
    Snapshot(Arc<Snapshot>),
    /// The set of in-flight dispatches changed.
    InFlight(BTreeSet<DispatchKey>),
    /// An action or sync failed.
    Error(ClientError),
}

/// Broadcasting presentation sink.
#[derive(Debug)]
pub struct ChannelSink {
    sender: broadcast::Sender<ViewEvent>,
}

impl ChannelSink {
    /// Create a sink with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to view events.
    pub fn subscribe(&self) -> broadcast::Receiver<ViewEvent> {
        self.sender.subscribe()
    }

    fn send(&self, event: ViewEvent) {
        // No subscribers is fine; the front-end may not be attached yet.
        if self.sender.send(event).is_err() {
            trace!("[sc-view] No view subscribers");
        }
    }
}

impl Default for ChannelSink {
    fn default() -> Self {
        Self::new(DEFAULT_VIEW_CAPACITY)
    }
}

impl PresentationSink for ChannelSink {
    fn publish_snapshot(&self, snapshot: &Snapshot) {
        self.send(ViewEvent::Snapshot(Arc::new(snapshot.clone())));
    }

    fn publish_in_flight(&self, in_flight: &BTreeSet<DispatchKey>) {
        self.send(ViewEvent::InFlight(in_flight.clone()));
    }

    fn report_error(&self, error: &ClientError) {
        self.send(ViewEvent::Error(error.clone()));
    }
}

/// Sink that forwards to several sinks in order.
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn PresentationSink>>,
}

impl FanoutSink {
    /// Create an empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with(mut self, sink: Arc<dyn PresentationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of sinks attached.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// True when no sink is attached.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl PresentationSink for FanoutSink {
    fn publish_snapshot(&self, snapshot: &Snapshot) {
        for sink in &self.sinks {
            sink.publish_snapshot(snapshot);
        }
    }

    fn publish_in_flight(&self, in_flight: &BTreeSet<DispatchKey>) {
        for sink in &self.sinks {
            sink.publish_in_flight(in_flight);
        }
    }

    fn report_error(&self, error: &ClientError) {
        for sink in &self.sinks {
            sink.report_error(error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ValidationError;
    use crate::ports::RecordingSink;

    #[tokio::test]
    async fn test_channel_sink_broadcasts() {
        let sink = ChannelSink::default();
        let mut rx = sink.subscribe();

        sink.publish_snapshot(&Snapshot::empty());
        sink.publish_in_flight(&BTreeSet::from([DispatchKey::Create]));
        sink.report_error(&ValidationError::EmptyName.into());

        assert!(matches!(rx.recv().await.unwrap(), ViewEvent::Snapshot(s) if s.is_empty()));
        assert!(matches!(rx.recv().await.unwrap(), ViewEvent::InFlight(set) if set.len() == 1));
        assert!(matches!(rx.recv().await.unwrap(), ViewEvent::Error(_)));
    }

    #[test]
    fn test_channel_sink_without_subscribers() {
        let sink = ChannelSink::new(0);
        sink.publish_snapshot(&Snapshot::empty());
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(RecordingSink::new());
        let b = Arc::new(RecordingSink::new());
        let fanout = FanoutSink::new().with(a.clone()).with(b.clone());
        assert_eq!(fanout.len(), 2);

        fanout.publish_snapshot(&Snapshot::empty());
        fanout.report_error(&ValidationError::NoActiveActor.into());

        assert_eq!(a.snapshots().len(), 1);
        assert_eq!(b.errors().len(), 1);
    }
}
