use thiserror::Error;

/// Errors from the receiver engine.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    #[error(transparent)]
    Path(#[from] pathsafe::PathError),

    #[error(transparent)]
    Transport(#[from] transport::TransportError),

    #[error(transparent)]
    Pairing(#[from] pairing::PairingError),

    #[error("received {received} bytes but header declared {declared}")]
    SizeMismatch { declared: u64, received: u64 },

    #[error("sha256 mismatch: header said {expected}, computed {got}")]
    DigestMismatch { expected: String, got: String },

    #[error("transfer rejected by confirmation hook")]
    RejectedByConfirmHook,

    #[error("TLS is required but no server identity was configured")]
    MissingServerIdentity,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
