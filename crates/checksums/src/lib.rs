#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Streaming SHA-256 hashing used for at-rest integrity verification.
//!
//! The wire protocol carries a `sha256_hex` digest of the whole file in the
//! header; the receiver must be able to reproduce that digest incrementally
//! as payload bytes arrive, and to re-seed the hasher from an on-disk prefix
//! when resuming an interrupted transfer. [`StreamingHasher`] covers both
//! cases; [`hex`] covers encoding/parsing the wire representation.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

pub mod strong;

pub use strong::Sha256;

/// Number of hex characters in a SHA-256 digest (`32` bytes × 2).
pub const DIGEST_HEX_LEN: usize = 64;

/// Size of the read buffer used when hashing files from disk.
const READ_BUF_SIZE: usize = 64 * 1024;

/// A SHA-256 hasher that can be fed incrementally and re-seeded from an
/// existing file prefix, matching the receiver's resume workflow.
#[derive(Debug, Clone, Default)]
pub struct StreamingHasher {
    inner: Sha256,
}

impl StreamingHasher {
    /// Creates a hasher with empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Creates a hasher pre-seeded with the first `prefix_len` bytes of
    /// `path`. Used on resume, where the existing temp file's prefix is
    /// known-good and must be folded into the digest before new payload
    /// bytes arrive.
    pub fn seeded_from_prefix(path: &Path, prefix_len: u64) -> io::Result<Self> {
        let mut file = File::open(path)?;
        let mut hasher = Self::new();
        let mut remaining = prefix_len;
        let mut buf = [0_u8; READ_BUF_SIZE];
        while remaining > 0 {
            let chunk = remaining.min(buf.len() as u64) as usize;
            file.read_exact(&mut buf[..chunk])?;
            hasher.update(&buf[..chunk]);
            remaining -= chunk as u64;
        }
        Ok(hasher)
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalizes the digest and returns the raw 32-byte output.
    #[must_use]
    pub fn finalize(self) -> [u8; 32] {
        self.inner.finalize()
    }

    /// Finalizes the digest and returns it as 64 lowercase hex characters.
    #[must_use]
    pub fn finalize_hex(self) -> String {
        hex::encode(&self.finalize())
    }
}

/// Computes the SHA-256 digest of an entire file, streaming it through a
/// fixed-size buffer rather than loading it into memory.
pub fn hash_file(path: &Path) -> io::Result<[u8; 32]> {
    let mut file = File::open(path)?;
    let mut hasher = StreamingHasher::new();
    let mut buf = [0_u8; READ_BUF_SIZE];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hasher.finalize())
}

/// Computes the SHA-256 digest of an entire file and returns it as 64
/// lowercase hex characters, the wire representation used by `sha256_hex`.
pub fn hash_file_hex(path: &Path) -> io::Result<String> {
    hash_file(path).map(|digest| hex::encode(&digest))
}

/// Hex encoding/decoding helpers for the 64-character `sha256_hex` wire
/// representation.
pub mod hex {
    use std::fmt::Write as _;

    /// Encodes `bytes` as lowercase hex.
    #[must_use]
    pub fn encode(bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len() * 2);
        for byte in bytes {
            write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
        }
        out
    }

    /// Returns `true` if `value` is exactly 64 lowercase hex characters, the
    /// format required of `sha256_hex` on the wire.
    #[must_use]
    pub fn is_valid_sha256_hex(value: &str) -> bool {
        value.len() == super::DIGEST_HEX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}
