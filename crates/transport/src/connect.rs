use std::sync::Arc;

use rustls::crypto::ring::default_provider;
use rustls::ClientConfig;
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::info;

use crate::config::ClientTrust;
use crate::error::TransportError;
use crate::fingerprint::fingerprint_der;
use crate::known_hosts::KnownHosts;
use crate::stream::BoxedStream;
use crate::verifier::AcceptAnyServerCert;

/// Opens a plain TCP connection to `host:port`.
pub async fn connect_plain(host: &str, port: u16) -> Result<BoxedStream, TransportError> {
    let stream = TcpStream::connect((host, port)).await?;
    stream.set_nodelay(true).ok();
    Ok(Box::new(stream))
}

/// Opens a TLS connection to `host:port`, then applies `trust` against the
/// peer's certificate fingerprint before returning the stream. The caller
/// must not send any application bytes before this returns successfully.
pub async fn connect_tls(
    host: &str,
    port: u16,
    trust: &ClientTrust,
) -> Result<BoxedStream, TransportError> {
    let tcp = TcpStream::connect((host, port)).await?;
    tcp.set_nodelay(true).ok();

    let provider = Arc::new(default_provider());
    let mut config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
        .with_no_client_auth();
    config.alpn_protocols.clear();

    let connector = TlsConnector::from(Arc::new(config));
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| TransportError::Incomplete("invalid TLS server name"))?;
    let tls = connector.connect(server_name, tcp).await?;

    let peer_certs = tls
        .get_ref()
        .1
        .peer_certificates()
        .ok_or(TransportError::NoPeerCertificate)?;
    let end_entity = peer_certs.first().ok_or(TransportError::NoPeerCertificate)?;
    let fingerprint = fingerprint_der(end_entity);

    match trust {
        ClientTrust::Insecure => {}
        ClientTrust::ExpectedPin(expected) => {
            if expected != &fingerprint {
                return Err(TransportError::FingerprintMismatch {
                    expected: expected.clone(),
                    got: fingerprint,
                });
            }
        }
        ClientTrust::Tofu { known_hosts_path } => {
            let endpoint = format!("{host}:{port}");
            let mut hosts = KnownHosts::load(known_hosts_path)?;
            let recorded = hosts.verify_or_record(&endpoint, &fingerprint)?;
            if recorded {
                hosts.save()?;
                info!(endpoint, fingerprint, "trust on first use");
            }
        }
    }

    Ok(Box::new(tls))
}
