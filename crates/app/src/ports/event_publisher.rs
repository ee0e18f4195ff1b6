//! Event publisher port — best-effort delivery of event payloads.

use std::future::Future;

use thermotrack_domain::error::ThermoTrackError;
use thermotrack_domain::event::EventPayload;

/// Publishes event payloads to the pub/sub channel.
///
/// Implementations must not wait for broker acknowledgement. Failures are
/// returned to the caller, which logs and moves on.
pub trait EventPublisher {
    /// Publish one payload.
    fn publish(
        &self,
        payload: EventPayload,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send;
}

impl<T: EventPublisher + Send + Sync> EventPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        payload: EventPayload,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send {
        (**self).publish(payload)
    }
}
