// ABOUTME: Connection bootstrap: builds the transmitter, starts the bind and waits for its outcome
// ABOUTME: Any non-connected outcome is fatal for the caller; nothing is retried

use crate::cli::config::ClientConfiguration;
use crate::cli::security::transport_security;
use crate::client::{BindCredentials, BindStatus, ConnStatus, Session, Transmitter};
use thiserror::Error;
use tracing::info;

/// Outcome of the one bind attempt a run makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Connected,
    /// Reason reported by the transport, ready for the operator
    Failed(String),
}

impl From<&BindStatus> for BindOutcome {
    fn from(status: &BindStatus) -> Self {
        match (status.status(), status.error()) {
            (ConnStatus::Connected, _) => BindOutcome::Connected,
            (other, Some(err)) => BindOutcome::Failed(format!("{other}: {err}")),
            (other, None) => BindOutcome::Failed(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("{0}")]
    BindFailed(String),
}

/// Session descriptor for `config`.
pub fn transmitter(config: &ClientConfiguration) -> Transmitter {
    let credentials = BindCredentials::transmitter(config.user.as_str(), config.passwd.as_str());
    Transmitter::new(config.addr.as_str(), credentials).with_tls(transport_security(config))
}

/// Binds a transmitter session using `config`.
///
/// Waits for the bind to settle, with no deadline of its own. On success the
/// returned `Session` stays bound until it is closed or dropped.
pub async fn connect(config: ClientConfiguration) -> Result<Session, BootstrapError> {
    info!("connecting to {}", config.addr);

    let (session, bind) = transmitter(&config).bind();
    let status = bind.await;

    match BindOutcome::from(&status) {
        BindOutcome::Connected => {
            info!("connected to {}", session.addr());
            Ok(session)
        }
        BindOutcome::Failed(reason) => Err(BootstrapError::BindFailed(reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SmppError;
    use crate::datatypes::CommandStatus;

    fn config(tls: bool) -> ClientConfiguration {
        ClientConfiguration {
            addr: "smsc.example.com:2775".to_string(),
            user: "bob".to_string(),
            passwd: "pw".to_string(),
            tls,
            precaire: true,
        }
    }

    #[test]
    fn transmitter_carries_resolved_settings() {
        let transmitter = transmitter(&config(true));
        assert_eq!(transmitter.addr, "smsc.example.com:2775");
        assert_eq!(transmitter.credentials.system_id, "bob");
        assert_eq!(transmitter.credentials.password, "pw");

        let tls = transmitter.tls.unwrap();
        assert_eq!(tls.server_name, "smsc.example.com");
        assert!(tls.insecure_skip_verify);

        assert!(super::transmitter(&config(false)).tls.is_none());
    }

    #[test]
    fn outcome_from_status() {
        assert_eq!(
            BindOutcome::from(&BindStatus::connected()),
            BindOutcome::Connected
        );

        let status = BindStatus::failed(SmppError::Protocol(CommandStatus::InvalidPassword));
        match BindOutcome::from(&status) {
            BindOutcome::Failed(reason) => {
                assert!(reason.starts_with("Bind failed"));
                assert!(reason.contains("ESME_RINVPASWD"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
