//! `SQLite` implementation of [`ReadingSink`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};

use thermotrack_app::ports::ReadingSink;
use thermotrack_domain::device::{Device, DeviceKind, SensorRecord};
use thermotrack_domain::error::ThermoTrackError;
use thermotrack_domain::id::{DeviceId, ReadingId};
use thermotrack_domain::time::Timestamp;

use crate::error::StorageError;

fn decode_err(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> sqlx::Error {
    sqlx::Error::Decode(err.into())
}

fn parse_timestamp(value: &str) -> Result<Timestamp, sqlx::Error> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.to_utc())
        .map_err(decode_err)
}

/// Row wrapper keeping sqlx out of the domain types.
struct DeviceRow(Device);

impl<'r> FromRow<'r, SqliteRow> for DeviceRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: uuid::Uuid = row.try_get("id")?;
        let kind: String = row.try_get("kind")?;
        let created_at: String = row.try_get("created_at")?;
        let last_seen_at: Option<String> = row.try_get("last_seen_at")?;

        Ok(Self(Device {
            id: DeviceId::from_uuid(id),
            device_uid: row.try_get("device_uid")?,
            name: row.try_get("name")?,
            kind: DeviceKind::from_str(&kind).map_err(decode_err)?,
            status: row.try_get("status")?,
            created_at: parse_timestamp(&created_at)?,
            last_seen_at: last_seen_at.as_deref().map(parse_timestamp).transpose()?,
        }))
    }
}

struct RecordRow(SensorRecord);

impl<'r> FromRow<'r, SqliteRow> for RecordRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let recorded_at: String = row.try_get("recorded_at")?;
        Ok(Self(SensorRecord {
            device_uid: row.try_get("device_uid")?,
            temperature: row.try_get("temperature")?,
            humidity: row.try_get("humidity")?,
            motion_detected: row.try_get("motion_detected")?,
            recorded_at: parse_timestamp(&recorded_at)?,
        }))
    }
}

const SELECT_DEVICE_BY_UID: &str = "SELECT * FROM devices WHERE device_uid = ?";
const INSERT_DEVICE: &str = r"
    INSERT INTO devices (id, device_uid, name, kind, status, created_at, last_seen_at)
    VALUES (?, ?, ?, ?, ?, ?, NULL)
";
const TOUCH_DEVICE: &str = "UPDATE devices SET last_seen_at = ? WHERE id = ?";
const INSERT_READING: &str = r"
    INSERT INTO readings (id, device_id, temperature, humidity, motion_detected, recorded_at)
    VALUES (?, ?, ?, ?, ?, ?)
";
const SELECT_RECENT: &str = r"
    SELECT d.device_uid, r.temperature, r.humidity, r.motion_detected, r.recorded_at
    FROM readings r
    JOIN devices d ON d.id = r.device_id
    WHERE d.device_uid = ?
    ORDER BY r.recorded_at DESC, r.rowid DESC
    LIMIT ?
";

/// `SQLite`-backed sensor history.
#[derive(Clone)]
pub struct SqliteReadingSink {
    pool: SqlitePool,
}

impl SqliteReadingSink {
    /// Create a new sink using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Look up a registered device by its uid.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub async fn find_device(&self, device_uid: &str) -> Result<Option<Device>, StorageError> {
        let row: Option<DeviceRow> = sqlx::query_as(SELECT_DEVICE_BY_UID)
            .bind(device_uid)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// The `limit` most recent records of a device, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the query fails.
    pub async fn recent_readings(
        &self,
        device_uid: &str,
        limit: u32,
    ) -> Result<Vec<SensorRecord>, StorageError> {
        let rows: Vec<RecordRow> = sqlx::query_as(SELECT_RECENT)
            .bind(device_uid)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}

async fn device_id_for(
    conn: &mut SqliteConnection,
    record: &SensorRecord,
) -> Result<DeviceId, ThermoTrackError> {
    let existing: Option<DeviceRow> = sqlx::query_as(SELECT_DEVICE_BY_UID)
        .bind(&record.device_uid)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::from)?;
    if let Some(DeviceRow(device)) = existing {
        return Ok(device.id);
    }

    let device = Device::discovered(&record.device_uid, record.device_kind())?;
    sqlx::query(INSERT_DEVICE)
        .bind(device.id.as_uuid())
        .bind(&device.device_uid)
        .bind(&device.name)
        .bind(device.kind.as_str())
        .bind(&device.status)
        .bind(device.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .map_err(StorageError::from)?;
    tracing::info!(device_uid = %device.device_uid, kind = %device.kind, "registered new device");
    Ok(device.id)
}

impl ReadingSink for SqliteReadingSink {
    fn record(
        &self,
        record: SensorRecord,
    ) -> impl Future<Output = Result<(), ThermoTrackError>> + Send {
        let pool = self.pool.clone();
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;
            let device_id = device_id_for(&mut tx, &record).await?;
            let recorded_at = record.recorded_at.to_rfc3339();

            sqlx::query(INSERT_READING)
                .bind(ReadingId::new().as_uuid())
                .bind(device_id.as_uuid())
                .bind(record.temperature)
                .bind(record.humidity)
                .bind(record.motion_detected)
                .bind(&recorded_at)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            sqlx::query(TOUCH_DEVICE)
                .bind(&recorded_at)
                .bind(device_id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use thermotrack_domain::error::ValidationError;
    use thermotrack_domain::time::now;

    use crate::pool::Config;

    async fn setup() -> SqliteReadingSink {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteReadingSink::new(db.pool().clone())
    }

    fn climate(uid: &str, temperature: f64, recorded_at: Timestamp) -> SensorRecord {
        SensorRecord {
            device_uid: uid.to_string(),
            temperature: Some(temperature),
            humidity: Some(40.0),
            motion_detected: false,
            recorded_at,
        }
    }

    #[tokio::test]
    async fn should_register_unknown_device_on_first_record() {
        let sink = setup().await;
        let at = now();

        sink.record(climate("dht22_sensor_01", 22.5, at)).await.unwrap();

        let device = sink.find_device("dht22_sensor_01").await.unwrap().unwrap();
        assert_eq!(device.name, "Sensor dht22_sensor_01");
        assert_eq!(device.kind, DeviceKind::Temperature);
        assert_eq!(device.status, "active");
        assert_eq!(
            device.last_seen_at.map(|ts| ts.timestamp()),
            Some(at.timestamp())
        );
    }

    #[tokio::test]
    async fn should_reuse_registered_device() {
        let sink = setup().await;
        let at = now();

        sink.record(climate("dht", 20.0, at)).await.unwrap();
        let first = sink.find_device("dht").await.unwrap().unwrap();
        sink.record(climate("dht", 21.0, at + Duration::seconds(2)))
            .await
            .unwrap();
        let second = sink.find_device("dht").await.unwrap().unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.last_seen_at > first.last_seen_at);
    }

    #[tokio::test]
    async fn should_register_motion_device_from_motion_record() {
        let sink = setup().await;
        let record = SensorRecord {
            device_uid: "pir_sensor_01".to_string(),
            temperature: None,
            humidity: None,
            motion_detected: true,
            recorded_at: now(),
        };

        sink.record(record).await.unwrap();

        let device = sink.find_device("pir_sensor_01").await.unwrap().unwrap();
        assert_eq!(device.kind, DeviceKind::Motion);
        let history = sink.recent_readings("pir_sensor_01", 10).await.unwrap();
        assert!(history[0].motion_detected);
        assert_eq!(history[0].temperature, None);
    }

    #[tokio::test]
    async fn should_return_recent_readings_newest_first() {
        let sink = setup().await;
        let t0 = now();
        for (i, temperature) in [20.0, 21.0, 22.0].into_iter().enumerate() {
            let at = t0 + Duration::seconds(i64::try_from(i).unwrap() * 2);
            sink.record(climate("dht", temperature, at)).await.unwrap();
        }

        let history = sink.recent_readings("dht", 2).await.unwrap();

        let temps: Vec<Option<f64>> = history.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![Some(22.0), Some(21.0)]);
    }

    #[tokio::test]
    async fn should_return_none_for_unknown_device() {
        let sink = setup().await;
        assert!(sink.find_device("ghost").await.unwrap().is_none());
        assert!(sink.recent_readings("ghost", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reject_blank_device_uid() {
        let sink = setup().await;

        let err = sink.record(climate("  ", 20.0, now())).await.unwrap_err();

        assert!(matches!(
            err,
            ThermoTrackError::Validation(ValidationError::EmptyDeviceUid)
        ));
    }
}
