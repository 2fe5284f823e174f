//! The sender engine (component C7): walks a batch, hashes each file,
//! negotiates resume with the receiver, and streams payload bytes.

mod error;
mod sender;

pub use error::TransferError;
pub use sender::{send_entries, BatchResult, Connector, EntryResult, SendOptions};
