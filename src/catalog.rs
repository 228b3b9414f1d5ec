//! Variable catalog
//!
//! Fixed mapping from the logical metric names stored in every sample to the
//! SNMP object identifiers requested from each target. The catalog is built
//! once at startup and shared read-only by every poll cycle.

use std::fmt;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

/// Logical metric carried by a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    SysName,
    SysDescr,
    CpuLoad1,
    MemTotal,
    MemFree,
}

impl MetricName {
    pub const ALL: [MetricName; 5] = [
        MetricName::SysName,
        MetricName::SysDescr,
        MetricName::CpuLoad1,
        MetricName::MemTotal,
        MetricName::MemFree,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SysName => "sysName",
            MetricName::SysDescr => "sysDescr",
            MetricName::CpuLoad1 => "cpuLoad1",
            MetricName::MemTotal => "memTotal",
            MetricName::MemFree => "memFree",
        }
    }

    /// OID of the metric in MIB-II / UCD-SNMP-MIB
    fn standard_oid(&self) -> &'static str {
        match self {
            MetricName::SysName => "1.3.6.1.2.1.1.5.0",
            MetricName::SysDescr => "1.3.6.1.2.1.1.1.0",
            MetricName::CpuLoad1 => "1.3.6.1.4.1.2021.10.1.3.1",
            MetricName::MemTotal => "1.3.6.1.4.1.2021.4.5.0",
            MetricName::MemFree => "1.3.6.1.4.1.2021.4.6.0",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dotted-numeric SNMP object identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId {
    dotted: String,
    arcs: Vec<u32>,
}

impl VariableId {
    /// Parse a dotted OID such as `1.3.6.1.2.1.1.5.0` (a leading dot is accepted).
    pub fn parse(oid: &str) -> anyhow::Result<Self> {
        let trimmed = oid.trim().trim_start_matches('.');
        let mut arcs = Vec::new();
        for part in trimmed.split('.') {
            if part.is_empty() {
                bail!("empty OID segment in {oid:?}");
            }
            arcs.push(
                part.parse::<u32>()
                    .with_context(|| format!("invalid OID segment {part}"))?,
            );
        }
        // BER packs the first two arcs into one subidentifier
        if arcs.len() < 2 || arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            bail!("OID {oid:?} is not a valid object identifier");
        }

        Ok(Self {
            dotted: arcs
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join("."),
            arcs,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.dotted
    }

    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted)
    }
}

/// Metric name to OID mapping used by every poll
#[derive(Debug, Clone)]
pub struct VariableCatalog {
    entries: Vec<(MetricName, VariableId)>,
}

impl VariableCatalog {
    /// The five variables every sample carries.
    pub fn standard() -> Self {
        let entries = MetricName::ALL
            .iter()
            .map(|metric| {
                let id = VariableId::parse(metric.standard_oid())
                    .unwrap_or_else(|_| unreachable!("standard OIDs are well-formed"));
                (*metric, id)
            })
            .collect();

        Self { entries }
    }

    pub fn set(&mut self, metric: MetricName, id: VariableId) {
        if let Some(entry) = self.entries.iter_mut().find(|(m, _)| *m == metric) {
            entry.1 = id;
        } else {
            self.entries.push((metric, id));
        }
    }

    pub fn id_of(&self, metric: MetricName) -> &VariableId {
        self.entries
            .iter()
            .find(|(m, _)| *m == metric)
            .map(|(_, id)| id)
            .unwrap_or_else(|| unreachable!("catalog always holds every metric"))
    }

    /// Identifiers in request order
    pub fn variable_ids(&self) -> Vec<VariableId> {
        self.entries.iter().map(|(_, id)| id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, &VariableId)> {
        self.entries.iter().map(|(m, id)| (*m, id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for VariableCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
