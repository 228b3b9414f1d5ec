//! Integration tests for storage persistence
//!
//! These tests verify that:
//! - Samples from a real poll cycle are persisted to SQLite
//! - Error strings survive the round trip
//! - The startup clear empties the table across reopen

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use snmp_telemetry::{
    actors::PollCycle,
    catalog::{MetricName, VariableCatalog},
    snmp::UdpSessionClient,
    storage::{TelemetryStore, sqlite::SqliteBackend},
};
use tempfile::tempdir;

use crate::helpers::{AgentMode, FakeAgent, host_table, host_table_without};

#[tokio::test]
async fn test_full_persistence_pipeline() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("telemetry.db");

    let host_a = FakeAgent::spawn("hostA", AgentMode::Answer(host_table("hostA", "0.42"))).await;
    let host_b = FakeAgent::spawn(
        "hostB",
        AgentMode::Answer(host_table_without("hostB", "0.07", MetricName::MemFree)),
    )
    .await;

    let store = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
    let cycle = PollCycle::new(
        Arc::new(UdpSessionClient::new("public")),
        store.clone(),
        vec![host_a.target.clone(), host_b.target.clone()],
        VariableCatalog::standard(),
        Duration::from_secs(1),
        4,
    );

    let report = cycle.run().await;
    assert_eq!(report.samples_stored, 2);

    let mut samples = store
        .query_since(Utc::now() - chrono::Duration::seconds(60))
        .await
        .unwrap();
    samples.sort_by(|a, b| a.container.cmp(&b.container));

    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].container, "hostA");
    assert_eq!(samples[0].cpu_load1.as_deref(), Some("0.42"));
    assert_eq!(samples[0].mem_free.as_deref(), Some("2512000"));
    assert_eq!(samples[1].container, "hostB");
    assert_eq!(
        samples[1].mem_free.as_deref(),
        Some("NoSuchObject: 1.3.6.1.4.1.2021.4.6.0")
    );
}

#[tokio::test]
async fn test_startup_clear_across_reopen() {
    let temp_dir = tempdir().unwrap();
    let db_path = temp_dir.path().join("telemetry.db");

    let host_a = FakeAgent::spawn("hostA", AgentMode::Answer(host_table("hostA", "0.42"))).await;

    {
        let store = Arc::new(SqliteBackend::new(&db_path).await.unwrap());
        let cycle = PollCycle::new(
            Arc::new(UdpSessionClient::new("public")),
            store.clone(),
            vec![host_a.target.clone()],
            VariableCatalog::standard(),
            Duration::from_secs(1),
            1,
        );
        cycle.run().await;
        cycle.run().await;
        store.close().await.unwrap();
    }

    let reopened = SqliteBackend::new(&db_path).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 2);

    assert_eq!(reopened.clear_all().await.unwrap(), 2);
    assert!(
        reopened
            .query_since(chrono::DateTime::<Utc>::MIN_UTC)
            .await
            .unwrap()
            .is_empty()
    );
}
