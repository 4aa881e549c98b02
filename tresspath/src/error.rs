use std::fmt;

use thiserror::Error;

/// Transport error codes from RFC 9000 section 20.1 that this subsystem can
/// surface. When the owning connection treats a violation as fatal, it echoes
/// the code in a CONNECTION_CLOSE frame of type 0x1c.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u64)]
pub enum TransportErrorCode {
    /// CONNECTION_ID_LIMIT_ERROR (0x09): the peer issued more connection IDs
    /// than the negotiated active_connection_id_limit permits.
    ConnectionIdLimit = 0x09,
    /// PROTOCOL_VIOLATION (0x0a): generic peer misbehaviour, used here for
    /// NEW_CONNECTION_ID frames that contradict earlier ones.
    ProtocolViolation = 0x0a,
}

impl TransportErrorCode {
    /// The wire value carried in CONNECTION_CLOSE.
    pub fn code(self) -> u64 {
        self as u64
    }
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}", self.code())
    }
}

/// All errors produced by the TressPath subsystem.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TressPathError {
    #[error("connection ID sequence {sequence} exceeds expected {largest_expected} plus limit {limit}")]
    CidLimitExceeded {
        sequence: u64,
        largest_expected: u64,
        limit: u64,
    },

    #[error("NEW_CONNECTION_ID for sequence {0} conflicts with previously registered contents")]
    CidConflict(u64),

    #[error("cannot retire sequence {0}: no such connection ID")]
    RetireUnknownSequence(u64),
}

impl TressPathError {
    /// RFC 9000 wire code for errors that are unambiguous peer protocol
    /// violations. `None` where the caller decides severity (a RETIRE frame
    /// for an unknown sequence may be a harmless duplicate).
    pub fn transport_code(&self) -> Option<TransportErrorCode> {
        match self {
            TressPathError::CidLimitExceeded { .. } => Some(TransportErrorCode::ConnectionIdLimit),
            TressPathError::CidConflict(_) => Some(TransportErrorCode::ProtocolViolation),
            TressPathError::RetireUnknownSequence(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TressPathError>;
