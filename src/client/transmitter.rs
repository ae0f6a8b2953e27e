// ABOUTME: Transmitter session factory: describes an SMSC endpoint and starts an asynchronous bind
// ABOUTME: bind() returns a session handle immediately plus a future resolving to the bind outcome

use crate::client::error::SmppError;
use crate::client::keepalive::KeepAliveConfig;
use crate::client::session::{self, Session};
use crate::client::tls::TlsOptions;
use crate::client::types::{BindCredentials, BindStatus};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Everything needed to open a transmitter session with an SMSC.
///
/// ```rust,no_run
/// use smpp_client::client::{BindCredentials, ConnStatus, TlsOptions, Transmitter};
///
/// # async fn example() {
/// let transmitter = Transmitter::new("smsc.example.com:2776", BindCredentials::transmitter("id", "pw"))
///     .with_tls(Some(TlsOptions::new("smsc.example.com")));
///
/// let (session, bind) = transmitter.bind();
/// let status = bind.await;
/// if status.status() == ConnStatus::Connected {
///     // ... the session stays bound until closed
///     session.close().await;
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Transmitter {
    /// SMSC endpoint as `host:port`
    pub addr: String,
    pub credentials: BindCredentials,
    /// `None` for plain TCP
    pub tls: Option<TlsOptions>,
    pub keep_alive: KeepAliveConfig,
}

impl Transmitter {
    pub fn new(addr: impl Into<String>, credentials: BindCredentials) -> Self {
        Self {
            addr: addr.into(),
            credentials,
            tls: None,
            keep_alive: KeepAliveConfig::default(),
        }
    }

    pub fn with_tls(mut self, tls: Option<TlsOptions>) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAliveConfig) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Starts connecting and binding in a background task.
    ///
    /// Returns at once. The `BindFuture` resolves exactly once with the
    /// outcome; the `Session` keeps the connection alive afterwards. There
    /// is no bind timeout beyond what the OS applies to the TCP connect.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn bind(self) -> (Session, BindFuture) {
        let (report_tx, report_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let addr = self.addr.clone();

        let task = tokio::spawn(session::run(self, report_tx, shutdown_rx));

        (
            Session::new(addr, shutdown_tx, task),
            BindFuture { rx: report_rx },
        )
    }
}

/// Resolves to the outcome of `Transmitter::bind`.
#[derive(Debug)]
#[must_use = "the bind outcome is only observable by awaiting this future"]
pub struct BindFuture {
    rx: oneshot::Receiver<BindStatus>,
}

impl Future for BindFuture {
    type Output = BindStatus;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<BindStatus> {
        Pin::new(&mut self.rx).poll(cx).map(|result| {
            // The task only drops the sender without reporting if it panicked.
            result.unwrap_or_else(|_| {
                BindStatus::failed(SmppError::InvalidState(
                    "session task ended before reporting the bind result".to_string(),
                ))
            })
        })
    }
}
