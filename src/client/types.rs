// ABOUTME: Supporting types for the transmitter session: credentials and the bind status handoff
// ABOUTME: BindStatus is the single value delivered through the bind future

use crate::client::error::SmppError;
use std::fmt;

/// SMPP bind operation credentials
///
/// Contains authentication information for establishing a transmitter
/// session with the SMSC.
#[derive(Clone, Default)]
pub struct BindCredentials {
    /// System identifier for authentication
    pub system_id: String,
    /// Password for authentication. Empty means "no password" (NULL on the wire).
    pub password: String,
    /// System type (optional, defaults to empty string)
    pub system_type: Option<String>,
}

impl BindCredentials {
    /// Create new bind credentials for a transmitter session
    pub fn transmitter(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: None,
        }
    }

    /// Set system type for the bind operation
    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = Some(system_type.into());
        self
    }
}

// Hand-written so the password never reaches a log line.
impl fmt::Debug for BindCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindCredentials")
            .field("system_id", &self.system_id)
            .field("password", &"<redacted>")
            .field("system_type", &self.system_type)
            .finish()
    }
}

/// Connection status reported by a bind attempt.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConnStatus {
    /// bind_transmitter_resp came back with ESME_ROK
    Connected,
    /// TCP connect or TLS handshake failed; no SMPP traffic was exchanged
    ConnectionFailed,
    /// The SMSC rejected the bind or broke the protocol while binding
    BindFailed,
}

impl fmt::Display for ConnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnStatus::Connected => "Connected",
            ConnStatus::ConnectionFailed => "Connection failed",
            ConnStatus::BindFailed => "Bind failed",
        };
        f.write_str(s)
    }
}

/// Result of one bind attempt, delivered exactly once by `BindFuture`.
#[derive(Debug)]
pub struct BindStatus {
    status: ConnStatus,
    error: Option<SmppError>,
}

impl BindStatus {
    pub fn connected() -> Self {
        Self {
            status: ConnStatus::Connected,
            error: None,
        }
    }

    /// Classifies `error` as a connection or bind failure.
    pub fn failed(error: SmppError) -> Self {
        let status = if error.is_transport() {
            ConnStatus::ConnectionFailed
        } else {
            ConnStatus::BindFailed
        };
        Self {
            status,
            error: Some(error),
        }
    }

    pub fn status(&self) -> ConnStatus {
        self.status
    }

    /// The reason behind a non-connected status.
    pub fn error(&self) -> Option<&SmppError> {
        self.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::CommandStatus;
    use std::io;

    #[test]
    fn transport_errors_are_connection_failures() {
        let status = BindStatus::failed(SmppError::Connection(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "refused",
        )));
        assert_eq!(status.status(), ConnStatus::ConnectionFailed);

        let status = BindStatus::failed(SmppError::InvalidServerName(String::new()));
        assert_eq!(status.status(), ConnStatus::ConnectionFailed);
    }

    #[test]
    fn smpp_errors_are_bind_failures() {
        let status = BindStatus::failed(SmppError::Protocol(CommandStatus::InvalidPassword));
        assert_eq!(status.status(), ConnStatus::BindFailed);
        assert!(status.error().unwrap().to_string().contains("ESME_RINVPASWD"));

        let status = BindStatus::failed(SmppError::ConnectionClosed);
        assert_eq!(status.status(), ConnStatus::BindFailed);
    }

    #[test]
    fn credentials_debug_hides_password() {
        let credentials = BindCredentials::transmitter("alice", "secret");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret"));
    }
}
