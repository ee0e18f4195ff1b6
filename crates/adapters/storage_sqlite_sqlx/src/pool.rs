//! Opening the history database.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::StorageError;

/// How long a writer waits on a locked database file before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
/// The sink writes one record at a time; a few connections cover the
/// occasional history query next to it.
const MAX_CONNECTIONS: u32 = 4;

/// Where the sensor history lives.
pub struct Config {
    /// `SQLite` connection URL (e.g. `sqlite:thermotrack.db?mode=rwc` or
    /// `sqlite::memory:`).
    pub database_url: String,
}

impl Config {
    /// Open (creating if missing) the database and bring its schema up to
    /// date.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the URL is invalid, the file cannot be
    /// opened, or a migration fails.
    pub async fn build(self) -> Result<Database, StorageError> {
        let options = SqliteConnectOptions::from_str(&self.database_url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(database_url = %self.database_url, "history database ready");

        Ok(Database { pool })
    }
}

/// An open, migrated history database.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory() -> Database {
        Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap()
    }

    async fn insert_device(db: &Database, uid: &str) -> Result<uuid::Uuid, sqlx::Error> {
        let id = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO devices (id, device_uid, name, kind, created_at) VALUES (?, ?, ?, 'Temperature', '2025-01-01T00:00:00Z')",
        )
        .bind(id)
        .bind(uid)
        .bind(format!("Sensor {uid}"))
        .execute(db.pool())
        .await?;
        Ok(id)
    }

    #[tokio::test]
    async fn should_create_history_schema() {
        let db = memory().await;

        let objects: Vec<(String, String)> = sqlx::query_as(
            "SELECT type, name FROM sqlite_master WHERE name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY type, name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();

        let objects: Vec<(&str, &str)> = objects
            .iter()
            .map(|(kind, name)| (kind.as_str(), name.as_str()))
            .collect();
        assert_eq!(
            objects,
            vec![
                ("index", "idx_readings_device_recorded_at"),
                ("table", "devices"),
                ("table", "readings"),
            ]
        );
    }

    #[tokio::test]
    async fn should_default_device_status_to_active() {
        let db = memory().await;
        insert_device(&db, "dht22_sensor_01").await.unwrap();

        let (status, last_seen): (String, Option<String>) =
            sqlx::query_as("SELECT status, last_seen_at FROM devices WHERE device_uid = ?")
                .bind("dht22_sensor_01")
                .fetch_one(db.pool())
                .await
                .unwrap();

        assert_eq!(status, "active");
        assert_eq!(last_seen, None);
    }

    #[tokio::test]
    async fn should_reject_duplicate_device_uid() {
        let db = memory().await;
        insert_device(&db, "pir_sensor_01").await.unwrap();

        assert!(insert_device(&db, "pir_sensor_01").await.is_err());
    }

    #[tokio::test]
    async fn should_enforce_reading_device_reference() {
        let db = memory().await;

        let orphan = sqlx::query(
            "INSERT INTO readings (id, device_id, temperature, humidity, motion_detected, recorded_at) VALUES (?, ?, 21.0, 40.0, 0, '2025-01-01T00:00:00Z')",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(uuid::Uuid::new_v4())
        .execute(db.pool())
        .await;

        assert!(orphan.is_err());
    }

    #[tokio::test]
    async fn should_drop_readings_with_their_device() {
        let db = memory().await;
        let device = insert_device(&db, "dht22_sensor_01").await.unwrap();
        sqlx::query(
            "INSERT INTO readings (id, device_id, temperature, humidity, motion_detected, recorded_at) VALUES (?, ?, 21.0, 40.0, 0, '2025-01-01T00:00:00Z')",
        )
        .bind(uuid::Uuid::new_v4())
        .bind(device)
        .execute(db.pool())
        .await
        .unwrap();

        sqlx::query("DELETE FROM devices WHERE id = ?")
            .bind(device)
            .execute(db.pool())
            .await
            .unwrap();

        let (left,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM readings")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(left, 0);
    }

    #[tokio::test]
    async fn should_reject_non_sqlite_url() {
        let config = Config {
            database_url: "postgres://nope".to_string(),
        };
        assert!(config.build().await.is_err());
    }
}
