//! In-process fan-out of event payloads.
//!
//! The control loop publishes here when no transport is configured, and the
//! MQTT adapter relays payloads it receives back from the broker. Consumers
//! such as the persistence service subscribe; the channel closes once every
//! publishing handle is dropped, which is how they learn about shutdown.

use std::future::Future;

use tokio::sync::broadcast;

use thermotrack_domain::error::ThermoTrackError;
use thermotrack_domain::event::EventPayload;

use crate::ports::EventPublisher;

/// Cloneable publishing handle over a bounded [`broadcast`] channel.
///
/// A subscriber that falls more than `capacity` payloads behind loses the
/// oldest ones. Publishing never fails, even with nobody listening.
#[derive(Clone)]
pub struct InProcessEventBus {
    sender: broadcast::Sender<EventPayload>,
}

impl InProcessEventBus {
    /// A bus retaining up to `capacity` (at least one) undelivered payloads.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A receiver for payloads published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<EventPayload> {
        self.sender.subscribe()
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(
        &self,
        payload: EventPayload,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send {
        let kind = payload.kind();
        let delivered_to = self.sender.send(payload).unwrap_or(0);
        tracing::debug!(kind, delivered_to, "event");
        async { Ok(()) }
    }
}
