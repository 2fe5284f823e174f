//! TLS connection setup and certificate trust pinning (component C5).
//!
//! Peers authenticate each other by certificate fingerprint rather than by
//! a trusted CA: [`connect::connect_tls`] always accepts the peer's
//! certificate chain at the handshake layer, then applies the configured
//! [`config::ClientTrust`] policy against the extracted fingerprint before
//! any payload bytes are exchanged.

mod config;
mod connect;
mod error;
mod fingerprint;
mod known_hosts;
mod listen;
mod stream;
mod verifier;

pub use config::{ClientTrust, ServerIdentity};
pub use connect::{connect_plain, connect_tls};
pub use error::TransportError;
pub use fingerprint::fingerprint_der;
pub use known_hosts::KnownHosts;
pub use listen::{accept_plain, accept_tls, build_acceptor};
pub use stream::{BoxedStream, DuplexStream};
