//! SQLite storage backend implementation
//!
//! Samples land in a single `telemetry` table. Timestamps are stored as Unix
//! milliseconds so range scans hit the timestamp index. Query thresholds are
//! rounded up to the next millisecond, so a stored row is returned only if
//! its timestamp really is at or after the threshold.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Readers (the query API) do not block the poller's inserts
//! - **Migrations**: Schema versioning with sqlx

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument, warn};

use super::backend::{HealthStatus, TelemetryStore};
use super::error::{StorageError, StorageResult};
use super::schema::{Sample, SampleId};

/// SQLite storage backend
pub struct SqliteBackend {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteBackend {
    /// Open (or create) the database at `db_path` and run migrations.
    ///
    /// ```no_run
    /// # use snmp_telemetry::storage::sqlite::SqliteBackend;
    /// # async fn example() -> anyhow::Result<()> {
    /// let backend = SqliteBackend::new("./telemetry.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite backend at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("SQLite backend ready");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    fn millis_to_timestamp(millis: i64) -> StorageResult<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis).ok_or_else(|| {
            StorageError::SerializationError(format!("timestamp {millis} out of range"))
        })
    }

    /// Smallest whole millisecond that is `>= threshold`
    fn threshold_millis(threshold: DateTime<Utc>) -> i64 {
        let millis = threshold.timestamp_millis();
        if threshold.timestamp_subsec_nanos() % 1_000_000 == 0 {
            millis
        } else {
            millis + 1
        }
    }

    fn row_to_sample(row: SqliteRow) -> StorageResult<Sample> {
        Ok(Sample {
            container: row.try_get("container")?,
            timestamp: Self::millis_to_timestamp(row.try_get("timestamp")?)?,
            sys_name: row.try_get("sys_name")?,
            sys_descr: row.try_get("sys_descr")?,
            cpu_load1: row.try_get("cpu_load1")?,
            mem_total: row.try_get("mem_total")?,
            mem_free: row.try_get("mem_free")?,
        })
    }
}

#[async_trait]
impl TelemetryStore for SqliteBackend {
    #[instrument(skip(self, sample), fields(container = %sample.container))]
    async fn insert(&self, sample: &Sample) -> StorageResult<SampleId> {
        let result = sqlx::query(
            r#"
            INSERT INTO telemetry (
                container, timestamp, sys_name, sys_descr,
                cpu_load1, mem_total, mem_free
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sample.container)
        .bind(sample.timestamp.timestamp_millis())
        .bind(&sample.sys_name)
        .bind(&sample.sys_descr)
        .bind(&sample.cpu_load1)
        .bind(&sample.mem_total)
        .bind(&sample.mem_free)
        .execute(&self.pool)
        .await?;

        Ok(SampleId(result.last_insert_rowid()))
    }

    #[instrument(skip(self), fields(threshold = %threshold))]
    async fn query_since(&self, threshold: DateTime<Utc>) -> StorageResult<Vec<Sample>> {
        let rows = sqlx::query(
            r#"
            SELECT container, timestamp, sys_name, sys_descr,
                   cpu_load1, mem_total, mem_free
            FROM telemetry
            WHERE timestamp >= ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(Self::threshold_millis(threshold))
        .fetch_all(&self.pool)
        .await?;

        let samples = rows
            .into_iter()
            .map(Self::row_to_sample)
            .collect::<StorageResult<Vec<_>>>()?;

        debug!("query returned {} samples", samples.len());
        Ok(samples)
    }

    #[instrument(skip(self))]
    async fn clear_all(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM telemetry")
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected();
        info!("deleted {} samples", deleted);
        Ok(deleted)
    }

    async fn count(&self) -> StorageResult<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM telemetry")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<HealthStatus> {
        match sqlx::query("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => Ok(HealthStatus {
                healthy: true,
                message: format!("SQLite backend operational ({})", self.db_path),
                backend: "sqlite",
            }),
            Err(e) => {
                warn!("health check failed: {}", e);
                Ok(HealthStatus {
                    healthy: false,
                    message: format!("health check failed: {}", e),
                    backend: "sqlite",
                })
            }
        }
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite backend");
        self.pool.close().await;
        Ok(())
    }
}
