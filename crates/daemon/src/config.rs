use std::path::PathBuf;
use std::sync::Arc;

use pairing::PairCodeGenerator;
use transport::ServerIdentity;

use crate::confirm::ConfirmHook;

/// Configuration for [`crate::start_receiver`].
pub struct ReceiverConfig {
    pub port: u16,
    pub output_dir: PathBuf,
    pub pair_code: Option<String>,
    pub rotate_per_transfer: bool,
    pub pair_ttl_seconds: Option<u64>,
    pub generator: Option<Arc<dyn PairCodeGenerator>>,
    pub on_pair_code_change: Option<Arc<dyn Fn(String) + Send + Sync>>,
    pub confirm_transfer: Option<Arc<dyn ConfirmHook>>,
    pub tls: Option<ServerIdentity>,
}

impl ReceiverConfig {
    #[must_use]
    pub fn new(port: u16, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            port,
            output_dir: output_dir.into(),
            pair_code: None,
            rotate_per_transfer: false,
            pair_ttl_seconds: None,
            generator: None,
            on_pair_code_change: None,
            confirm_transfer: None,
            tls: None,
        }
    }
}
