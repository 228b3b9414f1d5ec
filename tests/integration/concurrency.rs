//! Concurrency tests
//!
//! These tests verify that:
//! - Fetches within a cycle run in parallel
//! - Cycles never overlap, even when one outlasts the interval
//! - Shutdown lets the in-flight cycle finish

use std::sync::Arc;
use std::time::{Duration, Instant};

use snmp_telemetry::{
    actors::{PollCycle, PollerHandle},
    catalog::VariableCatalog,
    config::Target,
    snmp::UdpSessionClient,
    storage::{MemoryBackend, TelemetryStore},
};
use tokio::sync::broadcast;

use crate::helpers::{AgentMode, FakeAgent, host_table};

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
async fn test_cycle_latency_tracks_slowest_target() {
    let mut agents = Vec::new();
    for i in 0..4 {
        let name = format!("slow{i}");
        agents.push(
            FakeAgent::spawn(
                &name,
                AgentMode::Slow(Duration::from_millis(300), host_table(&name, "0.42")),
            )
            .await,
        );
    }

    let store = Arc::new(MemoryBackend::new());
    let cycle = cycle_for(
        agents.iter().map(|a| a.target.clone()).collect(),
        store.clone(),
        Duration::from_secs(2),
    );

    let start = Instant::now();
    let report = cycle.run().await;

    assert_eq!(report.samples_stored, 4);
    // Sequential fetches would take at least 1.2s
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn test_cycles_with_unreachable_targets_never_overlap() {
    let good = FakeAgent::spawn("good", AgentMode::Answer(host_table("good", "0.42"))).await;
    let silent = FakeAgent::spawn("silent", AgentMode::Silent).await;

    let store = Arc::new(MemoryBackend::new());
    // Each cycle waits out a 150ms timeout against a 50ms interval
    let cycle = cycle_for(
        vec![good.target.clone(), silent.target.clone()],
        store.clone(),
        Duration::from_millis(150),
    );

    let (report_tx, _) = broadcast::channel(16);
    let poller = PollerHandle::spawn(cycle, Duration::from_millis(50), report_tx);
    let mut reports = poller.subscribe();

    let mut trace = Vec::new();
    while trace.len() < 4 {
        let report = tokio::time::timeout(Duration::from_secs(5), reports.recv())
            .await
            .unwrap()
            .unwrap();
        trace.push(report);
    }

    let stats = poller.get_stats().await.unwrap();
    poller.shutdown().await.unwrap();

    for pair in trace.windows(2) {
        assert!(pair[0].finished_at <= pair[1].started_at);
    }
    assert!(stats.overruns >= 4);
    assert!(store.count().await.unwrap() >= 4);
}

#[tokio::test]
async fn test_shutdown_drains_in_flight_cycle() {
    let slow = FakeAgent::spawn(
        "slow",
        AgentMode::Slow(Duration::from_millis(200), host_table("slow", "0.42")),
    )
    .await;

    let store = Arc::new(MemoryBackend::new());
    let cycle = cycle_for(vec![slow.target.clone()], store.clone(), Duration::from_secs(1));

    let (report_tx, _) = broadcast::channel(16);
    let poller = PollerHandle::spawn(cycle, Duration::from_secs(3600), report_tx);

    tokio::time::sleep(Duration::from_millis(50)).await;
    poller.shutdown().await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_poll_now_requests_are_serialized() {
    let agent = FakeAgent::spawn("hostA", AgentMode::Answer(host_table("hostA", "0.42"))).await;
    let store = Arc::new(MemoryBackend::new());
    let cycle = cycle_for(vec![agent.target.clone()], store.clone(), Duration::from_secs(1));

    let (report_tx, _) = broadcast::channel(16);
    let poller = PollerHandle::spawn(cycle, Duration::from_secs(3600), report_tx);

    let requests = (0..5).map(|_| {
        let poller = poller.clone();
        async move { poller.poll_now().await }
    });
    let mut reports: Vec<_> = futures::future::join_all(requests)
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    poller.shutdown().await.unwrap();

    reports.sort_by_key(|report| report.started_at);
    for pair in reports.windows(2) {
        assert!(pair[0].finished_at <= pair[1].started_at);
    }

    // First scheduled cycle plus five on demand
    assert_eq!(store.count().await.unwrap(), 6);
    assert_eq!(agent.requests(), 6);
}
