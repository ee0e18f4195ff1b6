//! Sensor ports — polled climate and motion inputs.

use std::future::Future;
use std::sync::Arc;

use thermotrack_domain::reading::Reading;

/// Temperature/humidity source.
///
/// `poll` never fails: a transient fault is reported as a [`Reading`] with
/// both fields absent, and implementations bound the time a read may take.
pub trait ClimateSensor: Send + Sync {
    fn poll(&self) -> impl Future<Output = Reading> + Send;
}

/// Instantaneous digital motion level (`true` = HIGH).
///
/// No debouncing happens here; the control loop owns that policy.
pub trait MotionSensor: Send + Sync {
    fn read_motion(&self) -> bool;
}

impl<T: ClimateSensor> ClimateSensor for Arc<T> {
    fn poll(&self) -> impl Future<Output = Reading> + Send {
        (**self).poll()
    }
}

impl<T: MotionSensor> MotionSensor for Arc<T> {
    fn read_motion(&self) -> bool {
        (**self).read_motion()
    }
}
