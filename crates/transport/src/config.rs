use std::path::{Path, PathBuf};

use crate::error::TransportError;

/// The sender's trust policy for a TLS connection.
#[derive(Debug, Clone)]
pub enum ClientTrust {
    /// Skip fingerprint verification entirely. Only intended for
    /// self-signed testing.
    Insecure,
    /// Require the peer's fingerprint to equal this value.
    ExpectedPin(String),
    /// Trust-on-first-use against a known-hosts file.
    Tofu { known_hosts_path: PathBuf },
}

impl ClientTrust {
    /// Builds a trust policy from the mutually exclusive flags accepted at
    /// the API boundary, defaulting the known-hosts path when TOFU is
    /// requested without one.
    pub fn from_flags(
        insecure: bool,
        fingerprint: Option<String>,
        trust_on_first_use: bool,
        known_hosts_path: Option<PathBuf>,
    ) -> Result<Self, TransportError> {
        match (insecure, fingerprint, trust_on_first_use) {
            (true, None, false) => Ok(Self::Insecure),
            (false, Some(fp), false) => Ok(Self::ExpectedPin(fp)),
            (false, None, true) => {
                let path = known_hosts_path
                    .or_else(crate::known_hosts::KnownHosts::default_path)
                    .ok_or(TransportError::Incomplete(
                        "no known-hosts path available and no home directory could be resolved",
                    ))?;
                Ok(Self::Tofu {
                    known_hosts_path: path,
                })
            }
            (false, None, false) => Err(TransportError::Incomplete(
                "TLS enabled but no trust mode selected: pass insecure, fingerprint, or trust_on_first_use",
            )),
            _ => Err(TransportError::ConflictingTrustConfig(
                "insecure, fingerprint, and trust_on_first_use are mutually exclusive",
            )),
        }
    }
}

/// The receiver's TLS server identity: a certificate chain and matching
/// private key, both PEM-encoded on disk.
#[derive(Debug, Clone)]
pub struct ServerIdentity {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl ServerIdentity {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }

    pub(crate) fn load_cert_chain(
        &self,
    ) -> Result<Vec<rustls_pki_types::CertificateDer<'static>>, TransportError> {
        read_certs(&self.cert_path)
    }

    pub(crate) fn load_private_key(
        &self,
    ) -> Result<rustls_pki_types::PrivateKeyDer<'static>, TransportError> {
        read_private_key(&self.key_path)
    }
}

fn read_certs(path: &Path) -> Result<Vec<rustls_pki_types::CertificateDer<'static>>, TransportError> {
    let bytes = std::fs::read(path).map_err(|e| TransportError::KnownHosts {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| TransportError::InvalidPem {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn read_private_key(path: &Path) -> Result<rustls_pki_types::PrivateKeyDer<'static>, TransportError> {
    let bytes = std::fs::read(path).map_err(|e| TransportError::KnownHosts {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = std::io::BufReader::new(bytes.as_slice());
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| TransportError::InvalidPem {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .ok_or_else(|| TransportError::InvalidPem {
            path: path.to_path_buf(),
            reason: "no private key found in file".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_conflicting_trust_flags() {
        let err = ClientTrust::from_flags(true, Some("ab".into()), false, None).unwrap_err();
        assert!(matches!(err, TransportError::ConflictingTrustConfig(_)));
    }

    #[test]
    fn rejects_no_trust_mode_selected() {
        let err = ClientTrust::from_flags(false, None, false, None).unwrap_err();
        assert!(matches!(err, TransportError::Incomplete(_)));
    }

    #[test]
    fn accepts_expected_pin() {
        let trust = ClientTrust::from_flags(false, Some("ab".into()), false, None).unwrap();
        assert!(matches!(trust, ClientTrust::ExpectedPin(fp) if fp == "ab"));
    }
}
