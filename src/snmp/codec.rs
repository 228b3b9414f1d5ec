//! BER encoding of SNMPv2c messages
//!
//! Only the encoding direction lives here. Incoming datagrams are parsed with
//! `snmp::SnmpPdu::from_bytes` (see `reply.rs`).

use crate::catalog::VariableId;

/// SNMPv2c carries version number 1 on the wire
pub const SNMP_VERSION_2C: i64 = 1;

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OBJECT_IDENTIFIER: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_IP_ADDRESS: u8 = 0x40;
const TAG_COUNTER32: u8 = 0x41;
const TAG_GAUGE32: u8 = 0x42;
const TAG_TIMETICKS: u8 = 0x43;
const TAG_COUNTER64: u8 = 0x46;
const TAG_NO_SUCH_OBJECT: u8 = 0x80;
const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
const TAG_END_OF_MIB_VIEW: u8 = 0x82;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PduType {
    GetRequest,
    Response,
}

impl PduType {
    fn tag(&self) -> u8 {
        match self {
            PduType::GetRequest => 0xa0,
            PduType::Response => 0xa2,
        }
    }
}

/// Value half of a variable binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Null,
    Integer(i64),
    OctetString(Vec<u8>),
    ObjectIdentifier(Vec<u32>),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
}

impl WireValue {
    pub fn string(value: impl AsRef<str>) -> Self {
        WireValue::OctetString(value.as_ref().as_bytes().to_vec())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        match self {
            WireValue::Null => write_tlv(out, TAG_NULL, &[]),
            WireValue::Integer(v) => write_tlv(out, TAG_INTEGER, &integer_bytes(*v)),
            WireValue::OctetString(bytes) => write_tlv(out, TAG_OCTET_STRING, bytes),
            WireValue::ObjectIdentifier(arcs) => {
                write_tlv(out, TAG_OBJECT_IDENTIFIER, &oid_bytes(arcs))
            }
            WireValue::IpAddress(octets) => write_tlv(out, TAG_IP_ADDRESS, octets),
            WireValue::Counter32(v) => write_tlv(out, TAG_COUNTER32, &unsigned_bytes(*v as u64)),
            WireValue::Gauge32(v) => write_tlv(out, TAG_GAUGE32, &unsigned_bytes(*v as u64)),
            WireValue::TimeTicks(v) => write_tlv(out, TAG_TIMETICKS, &unsigned_bytes(*v as u64)),
            WireValue::Counter64(v) => write_tlv(out, TAG_COUNTER64, &unsigned_bytes(*v)),
            WireValue::NoSuchObject => write_tlv(out, TAG_NO_SUCH_OBJECT, &[]),
            WireValue::NoSuchInstance => write_tlv(out, TAG_NO_SUCH_INSTANCE, &[]),
            WireValue::EndOfMibView => write_tlv(out, TAG_END_OF_MIB_VIEW, &[]),
        }
    }
}

/// A complete community-based SNMPv2c message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub community: Vec<u8>,
    pub pdu_type: PduType,
    pub request_id: i32,
    pub error_status: u32,
    pub error_index: u32,
    pub varbinds: Vec<(Vec<u32>, WireValue)>,
}

impl Message {
    /// GET for every variable, all in one PDU
    pub fn get_request(community: &[u8], request_id: i32, variables: &[VariableId]) -> Self {
        Self {
            community: community.to_vec(),
            pdu_type: PduType::GetRequest,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: variables
                .iter()
                .map(|id| (id.arcs().to_vec(), WireValue::Null))
                .collect(),
        }
    }

    pub fn response(
        community: &[u8],
        request_id: i32,
        varbinds: Vec<(Vec<u32>, WireValue)>,
    ) -> Self {
        Self {
            community: community.to_vec(),
            pdu_type: PduType::Response,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    pub fn with_error(mut self, status: u32, index: u32) -> Self {
        self.error_status = status;
        self.error_index = index;
        self
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut varbind_list = Vec::new();
        for (name, value) in &self.varbinds {
            let mut varbind = Vec::new();
            write_tlv(&mut varbind, TAG_OBJECT_IDENTIFIER, &oid_bytes(name));
            value.encode(&mut varbind);
            write_tlv(&mut varbind_list, TAG_SEQUENCE, &varbind);
        }

        let mut pdu = Vec::new();
        write_tlv(&mut pdu, TAG_INTEGER, &integer_bytes(self.request_id as i64));
        write_tlv(&mut pdu, TAG_INTEGER, &integer_bytes(self.error_status as i64));
        write_tlv(&mut pdu, TAG_INTEGER, &integer_bytes(self.error_index as i64));
        write_tlv(&mut pdu, TAG_SEQUENCE, &varbind_list);

        let mut message = Vec::new();
        write_tlv(&mut message, TAG_INTEGER, &integer_bytes(SNMP_VERSION_2C));
        write_tlv(&mut message, TAG_OCTET_STRING, &self.community);
        write_tlv(&mut message, self.pdu_type.tag(), &pdu);

        let mut out = Vec::with_capacity(message.len() + 4);
        write_tlv(&mut out, TAG_SEQUENCE, &message);
        out
    }
}

fn write_tlv(out: &mut Vec<u8>, tag: u8, content: &[u8]) {
    out.push(tag);
    write_length(out, content.len());
    out.extend_from_slice(content);
}

fn write_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// Minimal two's complement big-endian encoding
fn integer_bytes(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant_zero = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0;
        let redundant_ones = bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0;
        if !(redundant_zero || redundant_ones) {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn unsigned_bytes(value: u64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let skip = bytes
        .iter()
        .take_while(|b| **b == 0)
        .count()
        .min(bytes.len() - 1);
    let mut out = Vec::with_capacity(bytes.len() - skip + 1);
    if bytes[skip] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[skip..]);
    out
}

fn oid_bytes(arcs: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    let (first, rest) = match arcs {
        [a, b, rest @ ..] => (*a as u64 * 40 + *b as u64, rest),
        [a] => (*a as u64 * 40, &[][..]),
        [] => return out,
    };
    write_subidentifier(&mut out, first);
    for arc in rest {
        write_subidentifier(&mut out, *arc as u64);
    }
    out
}

fn write_subidentifier(out: &mut Vec<u8>, value: u64) {
    let mut groups = vec![(value & 0x7f) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push(0x80 | (rest & 0x7f) as u8);
        rest >>= 7;
    }
    out.extend(groups.iter().rev());
}
