//! Persistence service — stores published events as sensor history.

use tokio::sync::broadcast;

use thermotrack_domain::device::SensorRecord;
use thermotrack_domain::error::ThermoTrackError;
use thermotrack_domain::event::EventPayload;

use crate::ports::ReadingSink;

/// Maps event payloads onto [`SensorRecord`]s and hands them to a sink.
pub struct PersistenceService<S> {
    sink: S,
}

impl<S: ReadingSink> PersistenceService<S> {
    /// Create a new service writing to `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Persist one payload.
    ///
    /// Returns `Ok(false)` for payloads that carry no sensor data
    /// (`hardware_state`).
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the sink.
    #[tracing::instrument(skip(self, payload), fields(kind = payload.kind(), device_uid = payload.device_uid()))]
    pub async fn handle(&self, payload: &EventPayload) -> Result<bool, ThermoTrackError> {
        let Some(record) = SensorRecord::from_event(payload) else {
            return Ok(false);
        };
        self.sink.record(record).await?;
        Ok(true)
    }

    /// Consume payloads from `events` until the channel closes.
    ///
    /// A failed write is logged and the next payload is processed.
    pub async fn run(self, mut events: broadcast::Receiver<EventPayload>) {
        loop {
            match events.recv().await {
                Ok(payload) => {
                    if let Err(err) = self.handle(&payload).await {
                        tracing::warn!(error = %err, kind = payload.kind(), "failed to persist event");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "persistence lagged behind, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("persistence service stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    use thermotrack_domain::actuator::{ActuatorState, HardwareStatus};
    use thermotrack_domain::motion::MotionTransition;
    use thermotrack_domain::reading::{Reading, ReadingSource};
    use thermotrack_domain::time::now;

    use crate::event_bus::InProcessEventBus;
    use crate::ports::EventPublisher;

    #[derive(Default)]
    struct InMemorySink {
        records: Mutex<Vec<SensorRecord>>,
        fail: bool,
    }

    impl ReadingSink for InMemorySink {
        fn record(
            &self,
            record: SensorRecord,
        ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send {
            let result = if self.fail {
                Err(ThermoTrackError::Storage(Box::new(std::io::Error::other(
                    "disk full",
                ))))
            } else {
                self.records.lock().unwrap().push(record);
                Ok(())
            };
            async { result }
        }
    }

    fn reading() -> EventPayload {
        EventPayload::reading(
            "dht22_sensor_01",
            &Reading::new(23.0, 45.0, ReadingSource::Hardware),
        )
    }

    #[tokio::test]
    async fn should_store_reading_payload() {
        let sink = Arc::new(InMemorySink::default());
        let service = PersistenceService::new(Arc::clone(&sink));

        assert!(service.handle(&reading()).await.unwrap());

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].device_uid, "dht22_sensor_01");
        assert_eq!(records[0].temperature, Some(23.0));
    }

    #[tokio::test]
    async fn should_skip_hardware_state_payload() {
        let sink = Arc::new(InMemorySink::default());
        let service = PersistenceService::new(Arc::clone(&sink));
        let status = HardwareStatus {
            actuators: ActuatorState::default(),
            manual_override: false,
            preset: None,
        };

        let stored = service
            .handle(&EventPayload::hardware_state("hardware_controller", status, now()))
            .await
            .unwrap();

        assert!(!stored);
        assert!(sink.records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_propagate_sink_error() {
        let service = PersistenceService::new(InMemorySink {
            fail: true,
            ..InMemorySink::default()
        });

        let err = service.handle(&reading()).await.unwrap_err();
        assert!(matches!(err, ThermoTrackError::Storage(_)));
    }

    #[tokio::test]
    async fn should_drain_bus_until_closed() {
        let sink = Arc::new(InMemorySink::default());
        let bus = InProcessEventBus::new(16);
        let rx = bus.subscribe();
        let task = tokio::spawn(PersistenceService::new(Arc::clone(&sink)).run(rx));

        bus.publish(reading()).await.unwrap();
        bus.publish(EventPayload::motion(
            "pir_sensor_01",
            MotionTransition::Started,
            now(),
        ))
        .await
        .unwrap();
        drop(bus);
        task.await.unwrap();

        let records = sink.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].motion_detected);
    }
}
