//! In-memory telemetry store (no persistence)
//!
//! Used when no storage is configured and throughout the tests.
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart
//! - **Unbounded**: Samples accumulate until `clear_all`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::{HealthStatus, TelemetryStore};
use super::error::StorageResult;
use super::schema::{Sample, SampleId};

#[derive(Debug)]
struct StoredSample {
    id: SampleId,
    sample: Sample,
}

#[derive(Debug, Default)]
struct Inner {
    samples: Vec<StoredSample>,
    next_id: i64,
}

/// In-memory backend
///
/// Append-only vector behind a `RwLock`; ids keep increasing across
/// `clear_all` so they are never reused.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

impl MemoryBackend {
    /// Create a new in-memory backend
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TelemetryStore for MemoryBackend {
    async fn insert(&self, sample: &Sample) -> StorageResult<SampleId> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let id = SampleId(inner.next_id);
        inner.samples.push(StoredSample {
            id,
            sample: sample.clone(),
        });
        Ok(id)
    }

    async fn query_since(&self, threshold: DateTime<Utc>) -> StorageResult<Vec<Sample>> {
        debug!("querying in-memory samples since {}", threshold);

        let inner = self.inner.read().await;
        Ok(inner
            .samples
            .iter()
            .filter(|stored| stored.sample.timestamp >= threshold)
            .map(|stored| stored.sample.clone())
            .collect())
    }

    async fn clear_all(&self) -> StorageResult<u64> {
        let mut inner = self.inner.write().await;
        let deleted = inner.samples.len() as u64;
        inner.samples.clear();
        debug!("cleared {} in-memory samples", deleted);
        Ok(deleted)
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.inner.read().await.samples.len() as u64)
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let inner = self.inner.read().await;
        let last_id = inner.samples.last().map(|stored| stored.id.0).unwrap_or(0);
        Ok(HealthStatus {
            healthy: true,
            message: format!(
                "In-memory storage operational ({} samples, last id {})",
                inner.samples.len(),
                last_id
            ),
            backend: "memory",
        })
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
