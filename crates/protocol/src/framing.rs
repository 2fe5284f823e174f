//! The newline-delimited JSON framing codec (component C1).
//!
//! [`FrameIo`] wraps a duplex byte stream (a TCP or TLS connection) and
//! owns the read-side buffer. Control frames are parsed out of that buffer
//! one newline at a time; once the caller is done reading control frames
//! for a session, [`FrameIo::take_residual`] hands back whatever bytes were
//! already buffered past the last frame so they can be treated as the start
//! of the raw payload stream.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::ProtocolError;

/// Maximum number of bytes buffered while looking for a frame-terminating
/// newline, including the newline itself. A frame that reaches this size
/// without terminating is rejected outright.
pub const MAX_FRAME_LEN: usize = 65_536;

/// Size of each chunk read from the underlying stream while searching for
/// a newline. Independent of `MAX_FRAME_LEN`; just an I/O granularity knob.
const READ_CHUNK: usize = 4096;

/// Wraps a duplex stream with newline-delimited JSON framing on the read
/// side and line-at-a-time JSON writes on the write side.
pub struct FrameIo<S> {
    inner: S,
    buf: Vec<u8>,
}

impl<S> FrameIo<S> {
    /// Wraps `inner` with an empty read buffer.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buf: Vec::new(),
        }
    }

    /// Returns any bytes already read past the last control frame, clearing
    /// the internal buffer. Call this once, after the final control frame
    /// of the header/ready handshake, before reading the raw payload.
    pub fn take_residual(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    /// Consumes the wrapper and returns the underlying stream.
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Borrows the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: AsyncRead + Unpin> FrameIo<S> {
    /// Reads one newline-terminated JSON control frame and deserializes it
    /// as `T`. `label` identifies the frame for the `connection closed
    /// before <label>` error message (e.g. `"header"`, `"ready"`, `"ack"`).
    pub async fn read_frame<T: DeserializeOwned>(
        &mut self,
        label: &str,
    ) -> Result<T, ProtocolError> {
        let line = self.read_line(label).await?;
        serde_json::from_slice(&line).map_err(ProtocolError::Malformed)
    }

    async fn read_line(&mut self, label: &str) -> Result<Vec<u8>, ProtocolError> {
        loop {
            if self.buf.len() >= MAX_FRAME_LEN {
                return Err(ProtocolError::FrameTooLarge);
            }
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line = self.buf.split_off(pos + 1);
                std::mem::swap(&mut self.buf, &mut line);
                line.truncate(line.len() - 1);
                return Ok(line);
            }

            let mut chunk = [0_u8; READ_CHUNK];
            let read = self.inner.read(&mut chunk).await?;
            if read == 0 {
                return Err(ProtocolError::ClosedBeforeFrame(label.to_string()));
            }
            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Reads up to `out.len()` raw payload bytes, draining any residual
    /// control-frame buffer first. Returns `0` only at end of stream.
    pub async fn read_payload(&mut self, out: &mut [u8]) -> Result<usize, ProtocolError> {
        if !self.buf.is_empty() {
            let take = self.buf.len().min(out.len());
            out[..take].copy_from_slice(&self.buf[..take]);
            self.buf.drain(..take);
            return Ok(take);
        }
        Ok(self.inner.read(out).await?)
    }
}

impl<S: AsyncWrite + Unpin> FrameIo<S> {
    /// Serializes `value` and writes it as one newline-terminated frame.
    pub async fn write_frame<T: Serialize>(&mut self, value: &T) -> Result<(), ProtocolError> {
        let mut line = serde_json::to_vec(value).map_err(ProtocolError::Malformed)?;
        line.push(b'\n');
        self.inner.write_all(&line).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Writes raw payload bytes (a thin pass-through kept here so callers
    /// don't need to reach into the wrapped stream directly).
    pub async fn write_payload(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.inner.write_all(data).await?;
        Ok(())
    }

    /// Half-closes the write side, signaling end-of-payload to the peer.
    pub async fn shutdown_write(&mut self) -> Result<(), ProtocolError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

/// Validates that a frame's `type` tag matches `expected`, returning
/// [`ProtocolError::UnexpectedType`] otherwise.
pub fn expect_type(expected: &'static str, got: &str) -> Result<(), ProtocolError> {
    if got == expected {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedType {
            expected,
            got: got.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{Ready, TransferHeader};
    use tokio::io::duplex;

    #[tokio::test]
    async fn round_trips_a_header_frame() {
        let (client, server) = duplex(1024);
        let mut client_io = FrameIo::new(client);
        let mut server_io = FrameIo::new(server);

        let header = TransferHeader::new("a/b.txt", 10, "a".repeat(64), None);
        client_io.write_frame(&header).await.unwrap();

        let received: TransferHeader = server_io.read_frame("header").await.unwrap();
        assert_eq!(received, header);
    }

    #[tokio::test]
    async fn residual_bytes_become_payload() {
        let (mut client, server) = duplex(1024);
        let mut server_io = FrameIo::new(server);

        // Simulate the client sending a ready-sized frame immediately
        // followed by payload bytes in the same write.
        let ready = Ready::accept(0, "/tmp/out");
        let mut line = serde_json::to_vec(&ready).unwrap();
        line.push(b'\n');
        line.extend_from_slice(b"PAYLOAD");
        client.write_all(&line).await.unwrap();
        drop(client);

        let _: Ready = server_io.read_frame("ready").await.unwrap();
        let residual = server_io.take_residual();
        assert_eq!(residual, b"PAYLOAD");
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut client, server) = duplex(1 << 17);
        let mut server_io = FrameIo::new(server);

        let huge = vec![b'a'; MAX_FRAME_LEN];
        tokio::spawn(async move {
            let _ = client.write_all(&huge).await;
        });

        let err = server_io.read_frame::<TransferHeader>("header").await;
        assert!(matches!(err, Err(ProtocolError::FrameTooLarge)));
    }

    #[tokio::test]
    async fn closed_before_frame_reports_label() {
        let (client, server) = duplex(1024);
        drop(client);
        let mut server_io = FrameIo::new(server);
        let err = server_io.read_frame::<TransferHeader>("header").await;
        match err {
            Err(ProtocolError::ClosedBeforeFrame(label)) => assert_eq!(label, "header"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
