// ABOUTME: Command-line client: configuration, transport security, bind bootstrap, heartbeat loop
// ABOUTME: run() strings the stages together the way the smpp_client binary uses them

//! Command-line client built on [`crate::client`].
//!
//! Data flows one way through the stages:
//!
//! ```text
//! CliArgs + env -> ClientConfiguration -> Option<TlsOptions> -> Session -> heartbeat
//! ```

pub mod args;
pub mod bootstrap;
pub mod config;
pub mod heartbeat;
pub mod security;

pub use args::{CliArgs, Command, RunClient};
pub use bootstrap::{BindOutcome, BootstrapError, connect};
pub use config::ClientConfiguration;
pub use heartbeat::{HEARTBEAT_INTERVAL, Heartbeat};

use std::future::Future;
use tracing::{error, warn};

pub const NAME: &str = "smpp_client";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// One client run: bind with `config`, then idle until `shutdown` fires.
///
/// A failed bind is logged and returned without entering the heartbeat loop.
/// `force` cuts the final unbind short, see [`heartbeat::idle`].
pub async fn run_with<F, G>(
    config: ClientConfiguration,
    shutdown: F,
    force: G,
) -> Result<Heartbeat, BootstrapError>
where
    F: Future<Output = ()>,
    G: Future<Output = ()>,
{
    let session = connect(config).await.inspect_err(|e| {
        error!("connection failed: {}", e);
    })?;

    Ok(heartbeat::idle(session, shutdown, force).await)
}

/// Runs the client from parsed arguments and the process environment until
/// Ctrl-C. A second Ctrl-C while unbinding exits without waiting further.
pub async fn run(args: &CliArgs) -> Result<Heartbeat, BootstrapError> {
    run_with(ClientConfiguration::from_env(args), ctrl_c(), ctrl_c()).await
}

/// Process exit status for the outcome of a run: 0 after a clean shutdown,
/// 1 when the session never came up.
pub fn exit_status(outcome: &Result<Heartbeat, BootstrapError>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(BootstrapError::BindFailed(_)) => 1,
    }
}

// Listening starts on first poll, so the second instance only sees later signals.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("unable to listen for Ctrl-C: {}", e);
        // Without a signal handler the client idles until killed.
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_bind_exits_non_zero() {
        let outcome = Err(BootstrapError::BindFailed("authentication failed".to_string()));
        assert_eq!(exit_status(&outcome), 1);
    }

    #[test]
    fn clean_shutdown_exits_zero() {
        assert_eq!(exit_status(&Ok(Heartbeat::default())), 0);
        let outcome = Ok(Heartbeat {
            beats: 12,
            first_beat: Some(HEARTBEAT_INTERVAL),
        });
        assert_eq!(exit_status(&outcome), 0);
    }
}
