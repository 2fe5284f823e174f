//! Facade crate: the programmatic surface a CLI or other collaborator
//! drives instead of reaching into the subsystem crates directly.
//!
//! [`start_receiver`], [`send_entries`], [`discover_devices`], and
//! [`build_transfer_entries`] are the whole of it; everything else here is
//! re-exports and the unified [`LandropError`] they return.

pub mod config;
pub mod error;

pub use config::{ReceiverConfig, SenderConfig, TlsClientConfig, TlsServerConfig};
pub use daemon::{ConfirmDecision, ConfirmFuture, ConfirmHook, ConfirmRequest, StopHandle};
pub use discovery::{DiscoverOptions, DiscoveredDevice, DEFAULT_TIMEOUT};
pub use error::{ConfigError, LandropError};
pub use logging::{init_tracing, LoggingError, Verbosity};
pub use pairing::PairingHandle;
pub use transfer::{BatchResult, EntryResult};
pub use walk::TransferEntry;

use std::sync::Arc;
use std::time::Duration;

use logging_sink::ProgressSink;

/// Starts the receiver engine. Validates `config` first, so a bad
/// combination (e.g. rotation requested without `generate_pair_code`)
/// fails before a socket is ever bound.
pub async fn start_receiver(
    config: ReceiverConfig,
) -> Result<(StopHandle, PairingHandle), LandropError> {
    config.validate().map_err(LandropError::Config)?;

    let generator: Option<Arc<dyn pairing::PairCodeGenerator>> = if config.generate_pair_code {
        Some(Arc::new(pairing::RandomPairCodeGenerator))
    } else {
        None
    };

    let mut receiver_config = daemon::ReceiverConfig::new(config.port, config.output_dir);
    receiver_config.pair_code = config.pair_code;
    receiver_config.rotate_per_transfer = config.rotate_per_transfer;
    receiver_config.pair_ttl_seconds = config.pair_ttl_seconds;
    receiver_config.generator = generator;
    receiver_config.on_pair_code_change = config.on_pair_code_change;
    receiver_config.confirm_transfer = config.confirm_transfer;
    receiver_config.tls = config
        .tls
        .map(|tls| transport::ServerIdentity::new(tls.cert_path, tls.key_path));

    let (stop, pairing) = daemon::start_receiver(receiver_config).await?;
    Ok((stop, pairing))
}

/// Sends `entries` to the receiver named in `config`, reporting progress
/// through `progress` as it goes. Validates `config` first.
pub async fn send_entries(
    entries: &[TransferEntry],
    config: SenderConfig,
    progress: &dyn ProgressSink,
) -> Result<BatchResult, LandropError> {
    config.validate().map_err(LandropError::Config)?;

    let connector = match &config.tls {
        Some(tls) if tls.enabled => {
            let trust = transport::ClientTrust::from_flags(
                tls.insecure,
                tls.fingerprint.clone(),
                tls.trust_on_first_use,
                tls.known_hosts_path.clone(),
            )
            .map_err(transfer::TransferError::Transport)?;
            transfer::Connector::Tls(trust)
        }
        _ => transfer::Connector::Plain,
    };

    let options = transfer::SendOptions {
        host: &config.host,
        port: config.port,
        connector,
        pair_code: config.pair_code,
    };

    Ok(transfer::send_entries(entries, options, progress).await?)
}

/// Browses for receivers on the LAN for up to `timeout`.
pub async fn discover_devices(
    timeout: Duration,
    options: DiscoverOptions,
) -> Result<Vec<DiscoveredDevice>, LandropError> {
    Ok(discovery::browse(timeout, options).await?)
}

/// Expands `path` (a file or directory) into the ordered batch of
/// transfer entries a sender would walk.
pub fn build_transfer_entries(path: &std::path::Path) -> Result<Vec<TransferEntry>, LandropError> {
    Ok(walk::build_transfer_entries(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_config_rejects_rotation_without_generator() {
        let mut config = ReceiverConfig::new(37373, "/tmp", "desk");
        config.rotate_per_transfer = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RotationWithoutGenerator)
        ));
    }
}
