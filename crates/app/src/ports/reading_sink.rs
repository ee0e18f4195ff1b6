//! Reading sink port — persistence of sensor history.

use std::future::Future;
use std::sync::Arc;

use thermotrack_domain::device::SensorRecord;
use thermotrack_domain::error::ThermoTrackError;

/// Stores sensor records, registering unknown devices on the way.
pub trait ReadingSink {
    /// Persist one record.
    fn record(
        &self,
        record: SensorRecord,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send;
}

impl<T: ReadingSink + Send + Sync> ReadingSink for Arc<T> {
    fn record(
        &self,
        record: SensorRecord,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send {
        (**self).record(record)
    }
}
