//! Storage backends for telemetry samples
//!
//! The poller appends samples, the query API reads them back by time window.
//! Both talk to the same `Arc<dyn TelemetryStore>`.
//!
//! ## Backends
//!
//! - **SQLite** (default): Embedded database file
//! - **In-Memory**: No persistence, used when storage is disabled and in tests
//!
//! ## Usage
//!
//! ```no_run
//! use snmp_telemetry::storage::{TelemetryStore, sqlite::SqliteBackend};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SqliteBackend::new("./telemetry.db").await?;
//!     let removed = backend.clear_all().await?;
//!     println!("removed {removed} samples");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, TelemetryStore};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryBackend;
pub use schema::{Sample, SampleId};
