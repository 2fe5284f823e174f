//! Shared-secret pairing admission for the receiver (component C4).
//!
//! A [`PairingHandle`] is cloned into every inbound session task. Sessions
//! bracket their admission check with [`PairingHandle::begin_session`] so a
//! concurrent TTL rotation never fires underneath an in-flight transfer.

mod error;
mod generator;
mod state;

pub use error::PairingError;
pub use generator::{generate_distinct, PairCodeGenerator, RandomPairCodeGenerator};
pub use state::{spawn_ttl_rotation, PairingHandle, SessionGuard};
