use thiserror::Error;

/// Errors from the pairing admission and rotation logic.
///
/// This is the `AuthError` kind from the system's error taxonomy, narrowed
/// to pair-code admission (TLS fingerprint errors live in `transport`).
#[derive(Debug, Error)]
pub enum PairingError {
    /// An incoming header's `pair_code` matched neither the current nor
    /// the (still-valid) previous code.
    #[error("pair code mismatch")]
    Mismatch,

    /// Rotation is configured but no code generator was supplied.
    #[error("pair rotation requires a code generator")]
    NoGenerator,

    /// A code generator failed to produce a code distinct from the
    /// current one within the retry budget.
    #[error("code generator failed to produce a distinct pair code after {0} attempts")]
    GeneratorExhausted(u32),
}
