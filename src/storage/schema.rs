//! Persisted sample definition
//!
//! One row per reachable target per poll cycle. Every metric column is a
//! nullable string: `None` means the variable was not part of the reply, while
//! a variable-level failure is stored as its error indicator string so
//! dashboards can show why a field is missing.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{MetricName, VariableCatalog};
use crate::snmp::RawReply;

/// Store-assigned identity of an inserted sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SampleId(pub i64);

/// A single telemetry sample stored in the `telemetry` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Name of the target this sample was read from
    pub container: String,

    /// When the reply was received (always UTC, whole milliseconds)
    pub timestamp: DateTime<Utc>,

    pub sys_name: Option<String>,
    pub sys_descr: Option<String>,
    pub cpu_load1: Option<String>,
    pub mem_total: Option<String>,
    pub mem_free: Option<String>,
}

impl Sample {
    /// An empty sample for `container`, all metrics unset.
    ///
    /// The timestamp is truncated to milliseconds, the resolution every
    /// backend can store.
    pub fn new(container: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            container: container.into(),
            timestamp: timestamp.trunc_subsecs(3),
            sys_name: None,
            sys_descr: None,
            cpu_load1: None,
            mem_total: None,
            mem_free: None,
        }
    }

    /// Build a sample from a decoded reply.
    ///
    /// Errored variables keep their error string.
    pub fn from_reply(
        container: impl Into<String>,
        timestamp: DateTime<Utc>,
        reply: &RawReply,
        catalog: &VariableCatalog,
    ) -> Self {
        let mut sample = Self::new(container, timestamp);
        for (metric, id) in catalog.iter() {
            let value = reply.get(id).map(|binding| binding.as_str().to_string());
            sample.set(metric, value);
        }
        sample
    }

    pub fn set(&mut self, metric: MetricName, value: Option<String>) {
        let field = match metric {
            MetricName::SysName => &mut self.sys_name,
            MetricName::SysDescr => &mut self.sys_descr,
            MetricName::CpuLoad1 => &mut self.cpu_load1,
            MetricName::MemTotal => &mut self.mem_total,
            MetricName::MemFree => &mut self.mem_free,
        };
        *field = value;
    }

    pub fn with(mut self, metric: MetricName, value: impl Into<String>) -> Self {
        self.set(metric, Some(value.into()));
        self
    }
}
