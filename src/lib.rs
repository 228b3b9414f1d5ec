//! Periodic SNMP telemetry poller
//!
//! Polls a fixed registry of targets for a small catalog of SNMP variables,
//! stores one sample per reachable target per cycle and serves the recent
//! samples over HTTP.

pub mod actors;
#[cfg(feature = "api")]
pub mod api;
pub mod catalog;
pub mod config;
pub mod snmp;
pub mod storage;
pub mod util;

pub use catalog::{MetricName, VariableCatalog, VariableId};
pub use config::{Config, Target};
pub use storage::{Sample, TelemetryStore};
