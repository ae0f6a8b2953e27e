//! SMPP v3.4 transmitter client.
//!
//! The crate is layered bottom-up:
//!
//! * [`codec`] and [`datatypes`] - the PDUs a transmitter session exchanges
//!   (bind_transmitter, enquire_link, unbind, generic_nack and responses)
//! * [`connection`] - frame I/O over plain TCP or TLS
//! * [`client`] - asynchronous bind, background session and keep-alive
//! * [`cli`] - configuration resolution and the bootstrap used by the
//!   `smpp_client` binary
//!
//! # Example
//!
//! ```rust,no_run
//! use smpp_client::client::{BindCredentials, ConnStatus, Transmitter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let credentials = BindCredentials::transmitter("system_id", "password");
//!     let (session, bind) = Transmitter::new("localhost:2775", credentials).bind();
//!
//!     let status = bind.await;
//!     if status.status() != ConnStatus::Connected {
//!         eprintln!("bind failed: {:?}", status.error());
//!         return;
//!     }
//!
//!     println!("bound to {}", session.addr());
//!     session.close().await;
//! }
//! ```

pub mod cli;
pub mod client;
pub mod codec;
pub mod connection;
pub mod datatypes;
mod macros;


// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader};

// Re-export the main client API for easy access
pub use client::{
    BindCredentials, BindFuture, BindStatus, ConnStatus, Session, SmppError, SmppResult,
    TlsOptions, Transmitter,
};
