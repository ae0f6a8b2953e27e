// ABOUTME: SMPP client error types for the transmitter session
// ABOUTME: Every failure on the bind path is funnelled into SmppError and reported through the bind future

use crate::codec::CodecError;
use crate::connection::ConnectionError;
use crate::datatypes::CommandStatus;
use std::io;
use thiserror::Error;

/// Error type for SMPP client operations
#[derive(Debug, Error)]
pub enum SmppError {
    /// I/O error during network operations (connection, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// TLS negotiation with the SMSC failed (bad certificate, name mismatch, ...)
    #[error("TLS handshake failed: {0}")]
    Tls(#[source] io::Error),

    /// The expected server identity cannot be used for certificate validation
    #[error("Invalid TLS server name '{0}'")]
    InvalidServerName(String),

    /// SMPP protocol error indicated by command_status field
    #[error("Protocol error: {0}")]
    Protocol(CommandStatus),

    /// PDU could not be encoded or decoded
    #[error("Invalid data: {0}")]
    Codec(#[from] CodecError),

    /// Unexpected PDU received (wrong response type for request)
    #[error("Unexpected PDU: expected {expected}, got {actual}")]
    UnexpectedPdu { expected: String, actual: String },

    /// Connection closed unexpectedly
    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    /// Client not in correct state for operation
    #[error("Invalid client state: {0}")]
    InvalidState(String),
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

impl From<ConnectionError> for SmppError {
    fn from(err: ConnectionError) -> Self {
        match err {
            ConnectionError::Io(e) => SmppError::Connection(e),
            ConnectionError::Codec(e) | ConnectionError::Malformed { source: e, .. } => {
                SmppError::Codec(e)
            }
            ConnectionError::Reset => SmppError::Connection(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )),
        }
    }
}

impl SmppError {
    /// True for failures that happened before an SMPP conversation could
    /// start: TCP connect, TLS handshake, server name.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SmppError::Connection(_) | SmppError::Tls(_) | SmppError::InvalidServerName(_)
        )
    }
}
