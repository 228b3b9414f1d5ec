//! SNMPv2c session layer
//!
//! One short-lived GET exchange per target per poll cycle:
//!
//! ```text
//! VariableCatalog ─► codec::Message::get_request ─► UDP datagram ─► agent
//!                                                                     │
//! RawReply ◄── reply::decode_reply (snmp::SnmpPdu) ◄── UDP datagram ◄─┘
//! ```
//!
//! Requests are encoded here because all catalog variables travel in a
//! single PDU. Replies are parsed with the `snmp` crate and classified per
//! variable into a value or an in-band error string.

pub mod client;
pub mod codec;
pub mod error;
pub mod reply;

pub use client::{SessionClient, UdpSessionClient};
pub use error::{SessionError, SessionResult};
pub use reply::{RawReply, VarBinding};
