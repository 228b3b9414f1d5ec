//! End-to-end poll cycles against fake UDP agents
//!
//! Real `UdpSessionClient`, real cycle, in-memory store.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use snmp_telemetry::{
    actors::PollCycle,
    catalog::{MetricName, VariableCatalog},
    config::Target,
    snmp::UdpSessionClient,
    storage::{MemoryBackend, TelemetryStore},
};

use crate::helpers::{AgentMode, FakeAgent, host_table, host_table_without};

fn cycle_for(targets: Vec<Target>, store: Arc<MemoryBackend>, timeout: Duration) -> PollCycle {
    PollCycle::new(
        Arc::new(UdpSessionClient::new("public")),
        store,
        targets,
        VariableCatalog::standard(),
        timeout,
        8,
    )
}

#[tokio::test]
async fn test_reachable_and_silent_host() {
    let host_a = FakeAgent::spawn("hostA", AgentMode::Answer(host_table("hostA", "0.42"))).await;
    let host_b = FakeAgent::spawn("hostB", AgentMode::Silent).await;

    let store = Arc::new(MemoryBackend::new());
    let cycle = cycle_for(
        vec![host_a.target.clone(), host_b.target.clone()],
        store.clone(),
        Duration::from_millis(300),
    );

    let report = cycle.run().await;

    let samples = store
        .query_since(Utc::now() - chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].container, "hostA");
    assert_eq!(samples[0].cpu_load1.as_deref(), Some("0.42"));
    assert_eq!(samples[0].sys_name.as_deref(), Some("hostA"));
    assert_eq!(samples[0].mem_total.as_deref(), Some("8048000"));

    assert_eq!(report.unreachable, 1);
    assert_eq!(host_b.requests(), 1);
}

#[tokio::test]
async fn test_missing_variable_is_stored_as_error_string() {
    let host_a = FakeAgent::spawn("hostA", AgentMode::Answer(host_table("hostA", "0.10"))).await;
    let host_b = FakeAgent::spawn(
        "hostB",
        AgentMode::Answer(host_table_without("hostB", "0.20", MetricName::MemFree)),
    )
    .await;

    let store = Arc::new(MemoryBackend::new());
    let cycle = cycle_for(
        vec![host_a.target.clone(), host_b.target.clone()],
        store.clone(),
        Duration::from_secs(1),
    );

    let report = cycle.run().await;
    assert_eq!(report.samples_stored, 2);
    assert_eq!(report.partial, 1);

    let samples = store
        .query_since(Utc::now() - chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(samples.len(), 2);

    let host_b = samples.iter().find(|s| s.container == "hostB").unwrap();
    assert_eq!(
        host_b.mem_free.as_deref(),
        Some("NoSuchObject: 1.3.6.1.4.1.2021.4.6.0")
    );
    assert_eq!(host_b.sys_name.as_deref(), Some("hostB"));
    assert_eq!(host_b.sys_descr.as_deref(), Some("Linux hostB 6.1.0"));
    assert_eq!(host_b.cpu_load1.as_deref(), Some("0.20"));
    assert_eq!(host_b.mem_total.as_deref(), Some("8048000"));
}

#[tokio::test]
async fn test_each_cycle_appends_new_samples() {
    let host_a = FakeAgent::spawn("hostA", AgentMode::Answer(host_table("hostA", "0.42"))).await;

    let store = Arc::new(MemoryBackend::new());
    let cycle = cycle_for(vec![host_a.target.clone()], store.clone(), Duration::from_secs(1));

    cycle.run().await;
    cycle.run().await;
    cycle.run().await;

    let samples = store
        .query_since(Utc::now() - chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(samples.len(), 3);
    assert!(samples.iter().all(|s| s.container == "hostA"));
    assert!(
        samples
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp)
    );
}

#[tokio::test]
async fn test_variable_override_is_requested() {
    let mut catalog = VariableCatalog::standard();
    catalog.set(
        MetricName::CpuLoad1,
        snmp_telemetry::catalog::VariableId::parse("1.3.6.1.4.1.2021.10.1.3.2").unwrap(),
    );

    let mut table = host_table("hostA", "0.42");
    table.insert(
        "1.3.6.1.4.1.2021.10.1.3.2".to_string(),
        snmp_telemetry::snmp::codec::WireValue::string("0.99"),
    );
    let host_a = FakeAgent::spawn("hostA", AgentMode::Answer(table)).await;

    let store = Arc::new(MemoryBackend::new());
    let cycle = PollCycle::new(
        Arc::new(UdpSessionClient::new("public")),
        store.clone(),
        vec![host_a.target.clone()],
        catalog,
        Duration::from_secs(1),
        1,
    );

    cycle.run().await;

    let samples = store
        .query_since(Utc::now() - chrono::Duration::seconds(60))
        .await
        .unwrap();
    assert_eq!(samples[0].cpu_load1.as_deref(), Some("0.99"));
}
