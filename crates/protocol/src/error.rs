use thiserror::Error;

/// Errors raised while reading or writing a control frame.
///
/// This is the `ProtocolError` kind from the system's error taxonomy:
/// malformed or oversized frames, the wrong message type arriving where
/// another was expected, or the peer closing the connection mid-frame.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The control-frame buffer reached [`crate::framing::MAX_FRAME_LEN`]
    /// bytes without a terminating newline.
    #[error("control frame exceeds maximum size of {} bytes", crate::framing::MAX_FRAME_LEN)]
    FrameTooLarge,

    /// The peer closed (or half-closed) the connection before a complete
    /// frame was available.
    #[error("connection closed before {0}")]
    ClosedBeforeFrame(String),

    /// The frame was valid UTF-8 up to the newline but failed to parse as
    /// the expected JSON shape.
    #[error("malformed control frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// A frame parsed successfully but carried an unexpected `type` tag.
    #[error("expected a '{expected}' frame but got '{got}'")]
    UnexpectedType {
        /// The `type` tag the caller required.
        expected: &'static str,
        /// The `type` tag actually present on the wire.
        got: String,
    },

    /// More payload bytes arrived than `file_size - offset` allowed.
    #[error("payload exceeded the declared file size")]
    PayloadOverrun,

    /// The underlying transport failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
