//! Test-only helpers shared across the workspace's integration tests.
//!
//! Nothing here is reachable from non-test code; crates depend on this as
//! a `dev-dependency` only.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;

/// A self-signed certificate/key pair written to PEM files in a temp
/// directory, plus the fingerprint of the certificate's DER encoding.
pub struct SelfSignedCert {
    dir: tempfile::TempDir,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub fingerprint: String,
}

impl SelfSignedCert {
    /// Generates a fresh self-signed certificate for `subject_alt_name`
    /// (typically `"localhost"`) and writes it to a temp directory that is
    /// cleaned up when this value is dropped.
    pub fn generate(subject_alt_name: &str) -> Self {
        let rcgen::CertifiedKey { cert, signing_key } =
            rcgen::generate_simple_self_signed([subject_alt_name.to_string()])
                .expect("self-signed cert generation cannot fail for a bare SAN");

        let dir = tempfile::tempdir().expect("tempdir creation");
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        std::fs::write(&cert_path, cert.pem()).unwrap();
        std::fs::write(&key_path, signing_key.serialize_pem()).unwrap();

        let fingerprint = sha256_hex(cert.der());

        Self {
            dir,
            cert_path,
            key_path,
            fingerprint,
        }
    }

    /// The directory holding the generated PEM files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}

fn sha256_hex(der: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(der);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Binds an ephemeral TCP port on loopback and returns the bound listener
/// along with the port it landed on, for tests that need a predictable
/// `host:port` pair without racing a separate "find a free port" step.
pub async fn loopback_listener() -> (TcpListener, u16) {
    let listener = TcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0))
        .await
        .expect("binding an ephemeral loopback port cannot fail in tests");
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}
