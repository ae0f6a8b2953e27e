// ABOUTME: SMPP transmitter client: asynchronous bind, session keep-alive and TLS transport
// ABOUTME: Exports the transmitter factory, session handle, bind status types and error types

//! SMPP Client Module
//!
//! An ESME bound as transmitter to an SMSC, over plain TCP or TLS.
//!
//! * **Asynchronous bind** - `Transmitter::bind` returns immediately with a
//!   session handle and a `BindFuture` that resolves once to a `BindStatus`
//! * **Background session** - a spawned task owns the connection, answers
//!   enquire_link and unbind from the SMSC, and pings idle links itself
//! * **TLS** - certificate validation against the webpki roots, or none at all
//!   for test SMSCs with self-signed certificates
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smpp_client::client::{BindCredentials, ConnStatus, Transmitter};
//!
//! # async fn example() {
//! let credentials = BindCredentials::transmitter("system_id", "password");
//! let (session, bind) = Transmitter::new("localhost:2775", credentials).bind();
//!
//! let status = bind.await;
//! match status.status() {
//!     ConnStatus::Connected => println!("bound to {}", session.addr()),
//!     _ => println!("bind failed: {:?}", status.error()),
//! }
//!
//! // Clean shutdown: unbind, then disconnect
//! session.close().await;
//! # }
//! ```

pub mod error;
pub mod keepalive;
mod session;
pub mod tls;
pub mod transmitter;
pub mod types;

// Re-export the main types for easy access
pub use error::{SmppError, SmppResult};
pub use keepalive::{KeepAliveConfig, KeepAliveManager, KeepAliveStatus};
pub use session::Session;
pub use tls::TlsOptions;
pub use transmitter::{BindFuture, Transmitter};
pub use types::{BindCredentials, BindStatus, ConnStatus};
