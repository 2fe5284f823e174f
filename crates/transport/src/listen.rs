use std::sync::Arc;

use rustls::crypto::ring::default_provider;
use rustls::ServerConfig;
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::config::ServerIdentity;
use crate::error::TransportError;
use crate::stream::BoxedStream;

/// Builds a reusable TLS acceptor from a certificate and key pair. Share
/// one acceptor across all inbound connections for the life of the
/// receiver.
pub fn build_acceptor(identity: &ServerIdentity) -> Result<TlsAcceptor, TransportError> {
    let cert_chain = identity.load_cert_chain()?;
    let key = identity.load_private_key()?;
    let provider = Arc::new(default_provider());
    let config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(cert_chain, key)?;
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Completes a TLS handshake on an already-accepted TCP connection.
pub async fn accept_tls(
    acceptor: &TlsAcceptor,
    stream: TcpStream,
) -> Result<BoxedStream, TransportError> {
    stream.set_nodelay(true).ok();
    let tls = acceptor.accept(stream).await?;
    Ok(Box::new(tls))
}

/// Wraps an already-accepted plain TCP connection with no further setup.
pub fn accept_plain(stream: TcpStream) -> BoxedStream {
    stream.set_nodelay(true).ok();
    Box::new(stream)
}
