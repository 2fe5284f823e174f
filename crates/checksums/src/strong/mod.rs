//! Strong digest primitives.
//!
//! `landrop` only negotiates one strong checksum algorithm (SHA-256). The
//! module is kept separate from [`crate::StreamingHasher`] so a future
//! additional digest can slot in beside [`Sha256`] without disturbing the
//! streaming/resume API callers already depend on.

mod sha256;

pub use sha256::Sha256;
