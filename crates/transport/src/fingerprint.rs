use sha2::{Digest, Sha256};

/// Computes the SHA-256 fingerprint of a DER-encoded certificate as 64
/// lowercase hex characters.
#[must_use]
pub fn fingerprint_der(der: &[u8]) -> String {
    let digest = Sha256::digest(der);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}
