//! Backend selection: real board devices, simulated ones, or a mix when only
//! part of the board is present.

use std::future::Future;

use thermotrack_adapter_gpio::{
    GpioConfig, HardwareError, IioClimateSensor, PinMap, SysfsActuators, SysfsMotionSensor,
};
use thermotrack_adapter_simulated::{MockActuators, SimulatedClimateSensor, SimulatedMotionSensor};
use thermotrack_app::ports::{Actuators, ClimateSensor, MotionSensor};
use thermotrack_domain::error::ThermoTrackError;
use thermotrack_domain::reading::Reading;

use crate::config::Backend;

pub enum AnyClimateSensor {
    Iio(IioClimateSensor),
    Simulated(SimulatedClimateSensor),
}

impl ClimateSensor for AnyClimateSensor {
    fn poll(&self) -> impl Future<Output = Reading> + Send {
        async move {
            match self {
                Self::Iio(sensor) => sensor.poll().await,
                Self::Simulated(sensor) => sensor.poll().await,
            }
        }
    }
}

pub enum AnyMotionSensor {
    Sysfs(SysfsMotionSensor),
    Simulated(SimulatedMotionSensor),
}

impl MotionSensor for AnyMotionSensor {
    fn read_motion(&self) -> bool {
        match self {
            Self::Sysfs(sensor) => sensor.read_motion(),
            Self::Simulated(sensor) => sensor.read_motion(),
        }
    }
}

pub enum AnyActuators {
    Sysfs(SysfsActuators),
    Mock(MockActuators),
}

impl Actuators for AnyActuators {
    fn set_fan(&self, on: bool) -> Result<(), ThermoTrackError> {
        match self {
            Self::Sysfs(outputs) => outputs.set_fan(on),
            Self::Mock(outputs) => outputs.set_fan(on),
        }
    }

    fn set_buzzer(&self, on: bool) -> Result<(), ThermoTrackError> {
        match self {
            Self::Sysfs(outputs) => outputs.set_buzzer(on),
            Self::Mock(outputs) => outputs.set_buzzer(on),
        }
    }

    fn set_led(&self, on: bool) -> Result<(), ThermoTrackError> {
        match self {
            Self::Sysfs(outputs) => outputs.set_led(on),
            Self::Mock(outputs) => outputs.set_led(on),
        }
    }

    fn cleanup(&self) -> Result<(), ThermoTrackError> {
        match self {
            Self::Sysfs(outputs) => outputs.cleanup(),
            Self::Mock(outputs) => outputs.cleanup(),
        }
    }
}

/// The devices the controller runs with.
pub struct Hardware {
    pub climate: AnyClimateSensor,
    pub motion: AnyMotionSensor,
    pub actuators: AnyActuators,
}

impl Hardware {
    fn simulated() -> Self {
        Self {
            climate: AnyClimateSensor::Simulated(SimulatedClimateSensor::new()),
            motion: AnyMotionSensor::Simulated(SimulatedMotionSensor::new()),
            actuators: AnyActuators::Mock(MockActuators::new()),
        }
    }
}

/// Open the devices for `backend`.
///
/// Outputs opened before a later failure are reset before the error is
/// returned.
///
/// # Errors
///
/// Returns [`HardwareError`] when the GPIO backend is required (explicitly,
/// or because `auto` found the GPIO interface) and cannot be opened.
pub fn select(backend: Backend, gpio: &GpioConfig, pins: &PinMap) -> Result<Hardware, HardwareError> {
    match backend {
        Backend::Simulated => {
            tracing::info!("simulated backend selected");
            Ok(Hardware::simulated())
        }
        Backend::Auto if !gpio.gpio_root.is_dir() => {
            tracing::warn!(
                gpio_root = %gpio.gpio_root.display(),
                "gpio interface not found, running with simulated devices"
            );
            Ok(Hardware::simulated())
        }
        Backend::Auto => open_board(gpio, pins, false),
        Backend::Gpio => open_board(gpio, pins, true),
    }
}

fn open_board(gpio: &GpioConfig, pins: &PinMap, strict: bool) -> Result<Hardware, HardwareError> {
    let actuators = SysfsActuators::open(gpio, pins)?;

    let motion = match SysfsMotionSensor::open(gpio, pins) {
        Ok(sensor) => sensor,
        Err(err) => {
            reset_outputs(&actuators);
            return Err(err);
        }
    };

    let climate = match IioClimateSensor::open(gpio) {
        Ok(sensor) => AnyClimateSensor::Iio(sensor),
        Err(err) if strict => {
            reset_outputs(&actuators);
            return Err(err);
        }
        Err(err) => {
            tracing::warn!(error = %err, "climate sensor not found, using simulated readings");
            AnyClimateSensor::Simulated(SimulatedClimateSensor::new())
        }
    };

    Ok(Hardware {
        climate,
        motion: AnyMotionSensor::Sysfs(motion),
        actuators: AnyActuators::Sysfs(actuators),
    })
}

fn reset_outputs(actuators: &SysfsActuators) {
    if let Err(err) = actuators.cleanup() {
        tracing::warn!(error = %err, "failed to reset outputs after init failure");
    }
}
