use thiserror::Error;

/// Errors from the sender engine.
///
/// [`TransferError::is_resumable`] distinguishes interrupts that a caller
/// should retry with the same request (the receiver will pick up the
/// resume offset where it left off) from errors that mean the request
/// itself was rejected or malformed and retrying verbatim won't help.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{0}")]
    Walk(#[from] walk::WalkError),

    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    #[error(transparent)]
    Transport(#[from] transport::TransportError),

    #[error("receiver rejected transfer: {0}")]
    RejectedByReceiver(String),

    #[error("receiver reported an invalid resume offset")]
    InvalidResumeOffset,

    #[error("transfer failed: {0}")]
    AckFailed(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TransferError {
    /// Whether this failure is safe to retry with an identical request.
    ///
    /// A resumable interrupt means the connection dropped (or the
    /// receiver explicitly rejected the attempt) before any data was
    /// corrupted; the receiver's resume-offset negotiation on the next
    /// attempt will pick up wherever the previous one left off.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        match self {
            Self::RejectedByReceiver(_) => true,
            Self::Protocol(protocol::ProtocolError::ClosedBeforeFrame(_)) => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}
