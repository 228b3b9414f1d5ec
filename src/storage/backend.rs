//! Telemetry store trait definition
//!
//! This module defines the core `TelemetryStore` trait that all
//! storage implementations must implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::StorageResult;
use super::schema::{Sample, SampleId};

/// Health status of the storage backend
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Backend name ("sqlite", "memory")
    pub backend: &'static str,
}

/// Append-only sample store
///
/// The store never updates or deletes individual samples. The only removal is
/// `clear_all`, which the hub calls once at startup.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`: one handle is shared by the poller
/// and the query API as `Arc<dyn TelemetryStore>`.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    /// Append one sample and return the id the store assigned to it.
    ///
    /// No deduplication: two inserts produce two retrievable samples.
    async fn insert(&self, sample: &Sample) -> StorageResult<SampleId>;

    /// All samples with `timestamp >= threshold`.
    ///
    /// Callers that chart the result should sort it by timestamp.
    async fn query_since(&self, threshold: DateTime<Utc>) -> StorageResult<Vec<Sample>>;

    /// Delete every sample, returning how many were removed
    async fn clear_all(&self) -> StorageResult<u64>;

    /// Number of stored samples
    async fn count(&self) -> StorageResult<u64>;

    /// Lightweight check that the backend is operational
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
