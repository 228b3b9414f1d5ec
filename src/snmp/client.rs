//! Session client: one GET exchange per target
//!
//! ## Contract
//!
//! `fetch` sends every requested variable in one datagram and waits for the
//! matching reply, bounded by `timeout`. It never retries; the next poll cycle
//! is the retry.
//!
//! - `Ok(reply)` - every variable decoded
//! - `Err(SessionError::VariableErrors { reply, .. })` - exchange succeeded,
//!   some variables carry error indicators
//! - any other `Err` - the target is unreachable for this cycle

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{UdpSocket, lookup_host};
use tracing::{debug, instrument, trace};

use super::codec::Message;
use super::error::{SessionError, SessionResult};
use super::reply::{RawReply, decode_reply};
use crate::catalog::VariableId;
use crate::config::Target;

/// Largest UDP payload we accept
const MAX_DATAGRAM: usize = 65_535;

/// Request/reply client used by the poll cycle.
///
/// Implementations must be `Send + Sync`; one instance is shared by all
/// workers of a cycle.
#[async_trait]
pub trait SessionClient: Send + Sync {
    async fn fetch(
        &self,
        target: &Target,
        variables: &[VariableId],
        timeout: Duration,
    ) -> SessionResult<RawReply>;
}

/// SNMPv2c client over UDP
pub struct UdpSessionClient {
    community: Vec<u8>,

    /// Request ids are unique per client so stale replies are recognizable
    next_request_id: AtomicI32,
}

impl UdpSessionClient {
    pub fn new(community: impl Into<String>) -> Self {
        let seed = (std::process::id() as i32 & 0x7fff) << 16;
        Self {
            community: community.into().into_bytes(),
            next_request_id: AtomicI32::new(seed.max(1)),
        }
    }

    fn next_request_id(&self) -> i32 {
        // Stay in the positive i32 range the snmp crate accepts
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed) & 0x7fff_ffff;
        id.max(1)
    }

    async fn exchange(
        &self,
        target: &Target,
        request: &[u8],
        request_id: i32,
        variables: &[VariableId],
    ) -> SessionResult<RawReply> {
        let peer = lookup_host((target.address.as_str(), target.port))
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} did not resolve to any address", target.address),
                )
            })?;

        let local: SocketAddr = if peer.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        socket.send(request).await?;

        trace!("sent request {request_id} to {peer}");

        let mut buf = vec![0u8; MAX_DATAGRAM];
        loop {
            let len = socket.recv(&mut buf).await?;
            match decode_reply(&buf[..len], request_id, variables) {
                Some(result) => return result,
                None => debug!("ignoring datagram from {peer}, still waiting for {request_id}"),
            }
        }
    }
}

#[async_trait]
impl SessionClient for UdpSessionClient {
    #[instrument(skip(self, variables), fields(target = %target.name))]
    async fn fetch(
        &self,
        target: &Target,
        variables: &[VariableId],
        timeout: Duration,
    ) -> SessionResult<RawReply> {
        let request_id = self.next_request_id();
        let request = Message::get_request(&self.community, request_id, variables).encode();

        match tokio::time::timeout(timeout, self.exchange(target, &request, request_id, variables))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(SessionError::Timeout(timeout)),
        }
    }
}
