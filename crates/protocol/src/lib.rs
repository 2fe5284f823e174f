//! Wire types and the newline-delimited JSON control-frame codec shared by
//! the sender and receiver engines.
//!
//! A transfer session exchanges exactly three control records —
//! [`wire::TransferHeader`], [`wire::Ready`], and [`wire::Ack`] — each
//! encoded as one UTF-8 JSON object terminated by `\n`. [`framing::FrameIo`]
//! owns the read-side buffering: it is the only place that decides where a
//! control frame ends and the raw payload stream begins.

pub mod error;
pub mod framing;
pub mod wire;

pub use error::ProtocolError;
pub use wire::{Ack, Ready, TransferHeader};
