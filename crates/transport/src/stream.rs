use tokio::io::{AsyncRead, AsyncWrite};

/// A duplex byte stream, plain or TLS, usable anywhere the transfer and
/// daemon crates need to hand a connection to `protocol::FrameIo`.
pub trait DuplexStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> DuplexStream for T {}

/// A boxed connection, independent of whether TLS is in use.
pub type BoxedStream = Box<dyn DuplexStream>;
