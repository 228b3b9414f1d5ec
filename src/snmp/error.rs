//! Error types for SNMP exchanges

use std::time::Duration;

use thiserror::Error;

use super::reply::RawReply;
use crate::catalog::VariableId;

pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    /// No matching reply arrived in time
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// Address resolution, socket or ICMP-level failure
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The reply could not be decoded or does not answer the request
    #[error("malformed reply: {0}")]
    Malformed(String),

    /// The agent rejected the whole request
    #[error("agent reported {} ({status}) at index {index}", status_label(.status))]
    Agent { status: u32, index: u32 },

    /// The exchange succeeded but some variables are unreadable.
    ///
    /// Carries the full reply, with the failed variables holding their error
    /// strings.
    #[error("one or more variables returned an error ({} of {})", .failed.len(), .reply.len())]
    VariableErrors {
        reply: RawReply,
        failed: Vec<VariableId>,
    },
}

impl SessionError {
    /// Whether the target produced no usable reply at all
    pub fn is_unreachable(&self) -> bool {
        !matches!(self, SessionError::VariableErrors { .. })
    }
}

fn status_label(status: &u32) -> &'static str {
    error_status_name(*status)
}

/// RFC 3416 error-status names
pub fn error_status_name(status: u32) -> &'static str {
    match status {
        0 => "noError",
        1 => "tooBig",
        2 => "noSuchName",
        3 => "badValue",
        4 => "readOnly",
        5 => "genErr",
        6 => "noAccess",
        7 => "wrongType",
        8 => "wrongLength",
        9 => "wrongEncoding",
        10 => "wrongValue",
        11 => "noCreation",
        12 => "inconsistentValue",
        13 => "resourceUnavailable",
        14 => "commitFailed",
        15 => "undoFailed",
        16 => "authorizationError",
        17 => "notWritable",
        18 => "inconsistentName",
        _ => "unknownError",
    }
}
