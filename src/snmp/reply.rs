//! Reply decoding and per-variable classification

use std::collections::BTreeMap;
use std::fmt::Write;

use snmp::{SnmpMessageType, SnmpPdu, Value};
use tracing::debug;

use super::error::{SessionError, SessionResult};
use crate::catalog::VariableId;

/// Outcome for one requested variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarBinding {
    /// Decoded and stringified value
    Value(String),

    /// In-band error indicator, e.g. `NoSuchObject: 1.3.6.1.4.1.2021.4.6.0`
    Error(String),
}

impl VarBinding {
    pub fn as_str(&self) -> &str {
        match self {
            VarBinding::Value(s) | VarBinding::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, VarBinding::Error(_))
    }
}

/// Decoded reply of one exchange, keyed by variable.
///
/// Transient: consumed by the poll cycle and never stored as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawReply {
    bindings: BTreeMap<VariableId, VarBinding>,
}

impl RawReply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: VariableId, binding: VarBinding) {
        self.bindings.insert(id, binding);
    }

    pub fn get(&self, id: &VariableId) -> Option<&VarBinding> {
        self.bindings.get(id)
    }

    /// Variables whose binding is an error indicator
    pub fn failed(&self) -> Vec<VariableId> {
        self.bindings
            .iter()
            .filter(|(_, binding)| binding.is_error())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl FromIterator<(VariableId, VarBinding)> for RawReply {
    fn from_iter<I: IntoIterator<Item = (VariableId, VarBinding)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().collect(),
        }
    }
}

/// Decode one datagram received for `request_id`.
///
/// Returns `None` for anything that does not answer this request (an
/// unparseable datagram or a message with another request id), so the caller
/// can keep waiting. Otherwise the result is the tagged outcome of the
/// exchange: a complete reply, `VariableErrors` carrying the partial reply, or
/// a hard failure.
pub fn decode_reply(
    bytes: &[u8],
    request_id: i32,
    requested: &[VariableId],
) -> Option<SessionResult<RawReply>> {
    let pdu = match SnmpPdu::from_bytes(bytes) {
        Ok(pdu) => pdu,
        Err(e) => {
            debug!("dropping unparseable datagram of {} bytes: {e:?}", bytes.len());
            return None;
        }
    };

    if pdu.req_id != request_id {
        return None;
    }

    Some(classify_pdu(pdu, requested))
}

fn classify_pdu(pdu: SnmpPdu<'_>, requested: &[VariableId]) -> SessionResult<RawReply> {
    if !matches!(pdu.message_type, SnmpMessageType::Response) {
        return Err(SessionError::Malformed(format!(
            "expected a response PDU, got {:?}",
            pdu.message_type
        )));
    }

    if pdu.error_status != 0 {
        return Err(SessionError::Agent {
            status: pdu.error_status,
            index: pdu.error_index,
        });
    }

    let mut reply = RawReply::new();
    let mut received = 0;

    for (position, (name, value)) in pdu.varbinds.enumerate() {
        let Some(id) = requested.get(position) else {
            return Err(SessionError::Malformed(format!(
                "reply carries more than the {} requested variables",
                requested.len()
            )));
        };

        let name = name.to_string();
        if name.trim_start_matches('.') != id.as_str() {
            return Err(SessionError::Malformed(format!(
                "OID {id} in request at position {position} does not match OID {name} in response"
            )));
        }

        reply.insert(id.clone(), classify_value(id, &value));
        received += 1;
    }

    if received != requested.len() {
        return Err(SessionError::Malformed(format!(
            "reply carries {received} of {} requested variables",
            requested.len()
        )));
    }

    let failed = reply.failed();
    if failed.is_empty() {
        Ok(reply)
    } else {
        Err(SessionError::VariableErrors { reply, failed })
    }
}

/// Turn one varbind value into a string or an error indicator
pub fn classify_value(id: &VariableId, value: &Value<'_>) -> VarBinding {
    match value {
        Value::OctetString(bytes) => VarBinding::Value(String::from_utf8_lossy(bytes).into_owned()),
        Value::Integer(v) => VarBinding::Value(v.to_string()),
        Value::Counter32(v) | Value::Unsigned32(v) | Value::Timeticks(v) => {
            VarBinding::Value(v.to_string())
        }
        Value::Counter64(v) => VarBinding::Value(v.to_string()),
        Value::IpAddress([a, b, c, d]) => VarBinding::Value(format!("{a}.{b}.{c}.{d}")),
        Value::ObjectIdentifier(oid) => {
            VarBinding::Value(oid.to_string().trim_start_matches('.').to_string())
        }
        Value::Opaque(bytes) => VarBinding::Value(bytes.iter().fold(
            String::with_capacity(bytes.len() * 2),
            |mut hex, byte| {
                let _ = write!(hex, "{byte:02x}");
                hex
            },
        )),
        Value::NoSuchObject => VarBinding::Error(format!("NoSuchObject: {id}")),
        Value::NoSuchInstance => VarBinding::Error(format!("NoSuchInstance: {id}")),
        Value::EndOfMibView => VarBinding::Error(format!("EndOfMibView: {id}")),
        Value::Null => VarBinding::Error(format!("Null: {id}")),
        _ => VarBinding::Error(format!("UnsupportedType: {id}")),
    }
}
