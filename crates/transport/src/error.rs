use std::path::PathBuf;

use thiserror::Error;

/// Errors from TLS setup and trust verification (the `TLSError`/`AuthError`
/// kinds of the system's error taxonomy that relate to transport, as
/// opposed to pairing).
#[derive(Debug, Error)]
pub enum TransportError {
    /// `fingerprint` (expected-pin mode) and `trust_on_first_use` were both
    /// set, or a TLS config mixed `insecure` with either pinning mode.
    #[error("conflicting TLS trust configuration: {0}")]
    ConflictingTrustConfig(&'static str),

    /// Pinning or TOFU is enabled but a cert/key pair was not supplied
    /// where one was required.
    #[error("TLS cert/key configuration is incomplete: {0}")]
    Incomplete(&'static str),

    /// The peer's certificate fingerprint did not match the configured
    /// expected fingerprint.
    #[error("TLS fingerprint mismatch: expected {expected}, got {got}")]
    FingerprintMismatch { expected: String, got: String },

    /// The peer's certificate fingerprint changed from the one recorded
    /// in the known-hosts file for this endpoint.
    #[error("TLS fingerprint changed for {host}: known {known}, now {got}")]
    FingerprintChanged {
        host: String,
        known: String,
        got: String,
    },

    /// The TLS handshake completed but presented no certificate at all.
    #[error("peer presented no TLS certificate")]
    NoPeerCertificate,

    /// Failed to read, parse, or write the known-hosts file.
    #[error("known-hosts file error at {path}: {source}")]
    KnownHosts {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a PEM certificate or private key file.
    #[error("failed to parse TLS material at {path}: {reason}")]
    InvalidPem { path: PathBuf, reason: String },

    /// A `rustls` configuration call failed.
    #[error(transparent)]
    Rustls(#[from] rustls::Error),

    /// The underlying TCP connection failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
