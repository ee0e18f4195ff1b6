//! DHT22 temperature/humidity through the kernel IIO driver.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thermotrack_app::ports::ClimateSensor;
use thermotrack_domain::reading::{Reading, ReadingSource};

use crate::config::GpioConfig;
use crate::error::HardwareError;

const TEMPERATURE_FILE: &str = "in_temp_input";
const HUMIDITY_FILE: &str = "in_humidityrelative_input";

/// Reads the IIO device directory of a DHT22.
#[derive(Debug, Clone)]
pub struct IioClimateSensor {
    device: PathBuf,
    timeout: Duration,
}

impl IioClimateSensor {
    /// # Errors
    ///
    /// Returns [`HardwareError::NotAvailable`] when the device directory does
    /// not exist.
    pub fn open(config: &GpioConfig) -> Result<Self, HardwareError> {
        if !config.iio_device.is_dir() {
            return Err(HardwareError::NotAvailable(config.iio_device.clone()));
        }
        tracing::info!(device = %config.iio_device.display(), "DHT22 via IIO ready");
        Ok(Self {
            device: config.iio_device.clone(),
            timeout: config.read_timeout(),
        })
    }

    async fn read(&self) -> Result<(f64, f64), HardwareError> {
        let temperature = read_milli(&self.device.join(TEMPERATURE_FILE)).await?;
        let humidity = read_milli(&self.device.join(HUMIDITY_FILE)).await?;
        if !(-40.0..=80.0).contains(&temperature) {
            return Err(HardwareError::OutOfRange {
                quantity: "temperature",
                value: temperature,
            });
        }
        if !(0.0..=100.0).contains(&humidity) {
            return Err(HardwareError::OutOfRange {
                quantity: "humidity",
                value: humidity,
            });
        }
        Ok((temperature, humidity))
    }
}

async fn read_milli(path: &Path) -> Result<f64, HardwareError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| HardwareError::io(path, err))?;
    let milli: i32 = raw.trim().parse().map_err(|_| HardwareError::Parse {
        path: path.to_path_buf(),
        value: raw.trim().to_string(),
    })?;
    Ok(f64::from(milli) / 1000.0)
}

impl ClimateSensor for IioClimateSensor {
    fn poll(&self) -> impl Future<Output = Reading> + Send {
        async move {
            let result = match tokio::time::timeout(self.timeout, self.read()).await {
                Ok(result) => result,
                Err(_) => Err(HardwareError::Timeout(self.timeout)),
            };
            match result {
                Ok((temperature, humidity)) => {
                    Reading::new(temperature, humidity, ReadingSource::Hardware)
                }
                Err(err) => {
                    // The DHT22 fails a checksum every few reads; the loop retries.
                    tracing::warn!(error = %err, "DHT22 read failed");
                    Reading::unavailable(ReadingSource::Hardware)
                }
            }
        }
    }
}
