//! Helper functions for integration tests

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use snmp_telemetry::{
    catalog::{MetricName, VariableCatalog, VariableId},
    config::Target,
    snmp::codec::{Message, WireValue},
};
use tokio::net::UdpSocket;

/// How a fake agent answers GET requests
#[derive(Clone)]
pub enum AgentMode {
    /// Answer from the table; OIDs missing from it get `noSuchObject`
    Answer(HashMap<String, WireValue>),

    /// Receive requests but never reply
    Silent,

    /// Reply with a PDU-level error status
    Reject(u32),

    /// Send a reply for another request id first, then the real one
    StrayThenAnswer(HashMap<String, WireValue>),

    /// Answer after a delay
    Slow(Duration, HashMap<String, WireValue>),
}

/// A UDP SNMP agent bound to 127.0.0.1 on a random port
pub struct FakeAgent {
    pub target: Target,
    requests: Arc<AtomicUsize>,
}

impl FakeAgent {
    pub async fn spawn(name: &str, mode: AgentMode) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        tokio::spawn(async move {
            let mut buf = vec![0u8; 65_535];
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    return;
                };
                counter.fetch_add(1, Ordering::SeqCst);

                let pdu = snmp::SnmpPdu::from_bytes(&buf[..len]).unwrap();
                let request_id = pdu.req_id;
                let names: Vec<Vec<u32>> = pdu
                    .varbinds
                    .map(|(name, _)| {
                        VariableId::parse(name.to_string().trim_start_matches('.'))
                            .unwrap()
                            .arcs()
                            .to_vec()
                    })
                    .collect();

                let answer = |table: &HashMap<String, WireValue>| {
                    let varbinds = names
                        .iter()
                        .map(|arcs| {
                            let key = arcs
                                .iter()
                                .map(u32::to_string)
                                .collect::<Vec<_>>()
                                .join(".");
                            let value = table.get(&key).cloned().unwrap_or(WireValue::NoSuchObject);
                            (arcs.clone(), value)
                        })
                        .collect();
                    Message::response(b"public", request_id, varbinds).encode()
                };

                match &mode {
                    AgentMode::Answer(table) => {
                        socket.send_to(&answer(table), peer).await.unwrap();
                    }
                    AgentMode::Silent => {}
                    AgentMode::Reject(status) => {
                        let reply = Message::response(b"public", request_id, Vec::new())
                            .with_error(*status, 1)
                            .encode();
                        socket.send_to(&reply, peer).await.unwrap();
                    }
                    AgentMode::StrayThenAnswer(table) => {
                        let stray = Message::response(
                            b"public",
                            request_id.wrapping_add(1000),
                            Vec::new(),
                        )
                        .encode();
                        socket.send_to(&stray, peer).await.unwrap();
                        socket.send_to(&answer(table), peer).await.unwrap();
                    }
                    AgentMode::Slow(delay, table) => {
                        tokio::time::sleep(*delay).await;
                        socket.send_to(&answer(table), peer).await.unwrap();
                    }
                }
            }
        });

        Self {
            target: Target::new(name, "127.0.0.1", port),
            requests,
        }
    }

    /// Number of requests the agent has received
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Full reply table for a healthy host
pub fn host_table(sys_name: &str, cpu_load: &str) -> HashMap<String, WireValue> {
    let catalog = VariableCatalog::standard();
    MetricName::ALL
        .into_iter()
        .map(|metric| {
            let value = match metric {
                MetricName::SysName => WireValue::string(sys_name),
                MetricName::SysDescr => WireValue::string(format!("Linux {sys_name} 6.1.0")),
                MetricName::CpuLoad1 => WireValue::string(cpu_load),
                MetricName::MemTotal => WireValue::Integer(8_048_000),
                MetricName::MemFree => WireValue::Integer(2_512_000),
            };
            (catalog.id_of(metric).as_str().to_string(), value)
        })
        .collect()
}

/// `host_table` without one metric, which the agent then reports missing
pub fn host_table_without(
    sys_name: &str,
    cpu_load: &str,
    missing: MetricName,
) -> HashMap<String, WireValue> {
    let mut table = host_table(sys_name, cpu_load);
    table.remove(VariableCatalog::standard().id_of(missing).as_str());
    table
}

/// A port nothing listens on
pub async fn closed_port() -> u16 {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap().port()
}
