use std::path::PathBuf;
use std::sync::Arc;

use daemon::ConfirmHook;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default transfer TCP/TLS port, matching the documented default.
pub const DEFAULT_PORT: u16 = 37373;

/// Default mDNS service type receivers advertise under.
pub const DEFAULT_SERVICE_NAME: &str = "landrop";

/// The receiver's TLS server identity, as PEM-encoded files on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TlsServerConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// The sender's TLS trust policy, mirroring `transport::ClientTrust`'s
/// mutually exclusive flags at the serializable API boundary.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TlsClientConfig {
    pub enabled: bool,
    pub insecure: bool,
    pub fingerprint: Option<String>,
    pub trust_on_first_use: bool,
    pub known_hosts_path: Option<PathBuf>,
}

/// Configuration for [`crate::start_receiver`].
///
/// `on_pair_code_change` and `confirm_transfer` are callback-shaped and
/// therefore not serializable; they default to `None` across a
/// serialize/deserialize round trip rather than failing it.
#[derive(Clone, Serialize, Deserialize)]
pub struct ReceiverConfig {
    pub port: u16,
    pub output_dir: PathBuf,
    pub service_name: String,
    pub pair_code: Option<String>,
    #[serde(default)]
    pub rotate_per_transfer: bool,
    pub pair_ttl_seconds: Option<u64>,
    #[serde(default)]
    pub generate_pair_code: bool,
    #[serde(skip)]
    pub on_pair_code_change: Option<Arc<dyn Fn(String) + Send + Sync>>,
    #[serde(skip)]
    pub confirm_transfer: Option<Arc<dyn ConfirmHook>>,
    pub tls: Option<TlsServerConfig>,
}

impl ReceiverConfig {
    #[must_use]
    pub fn new(port: u16, output_dir: impl Into<PathBuf>, service_name: impl Into<String>) -> Self {
        Self {
            port,
            output_dir: output_dir.into(),
            service_name: service_name.into(),
            pair_code: None,
            rotate_per_transfer: false,
            pair_ttl_seconds: None,
            generate_pair_code: false,
            on_pair_code_change: None,
            confirm_transfer: None,
            tls: None,
        }
    }

    /// Validates combinations the type alone can't rule out: rotation (by
    /// TTL or per-transfer) requires a code generator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rotation_requested = self.rotate_per_transfer || self.pair_ttl_seconds.is_some();
        if rotation_requested && !self.generate_pair_code {
            return Err(ConfigError::RotationWithoutGenerator);
        }
        Ok(())
    }
}

impl Default for ReceiverConfig {
    /// Matches the documented defaults: port 37373, current directory,
    /// service name "landrop", no pairing or TLS configured.
    fn default() -> Self {
        Self::new(DEFAULT_PORT, ".", DEFAULT_SERVICE_NAME)
    }
}

/// Configuration for [`crate::send_entries`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderConfig {
    pub host: String,
    pub port: u16,
    pub pair_code: Option<String>,
    pub tls: Option<TlsClientConfig>,
}

impl SenderConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            pair_code: None,
            tls: None,
        }
    }

    /// Validates the TLS trust flags are mutually exclusive before any
    /// connection is attempted.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tls) = &self.tls {
            if tls.enabled {
                let selected = [tls.insecure, tls.fingerprint.is_some(), tls.trust_on_first_use]
                    .into_iter()
                    .filter(|b| *b)
                    .count();
                if selected > 1 {
                    return Err(ConfigError::ConflictingTlsTrust);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_receiver_config_matches_documented_port() {
        let config = ReceiverConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
    }

    #[test]
    fn rotation_without_generator_is_rejected() {
        let mut config = ReceiverConfig::new(37373, "/tmp/out", "desk");
        config.rotate_per_transfer = true;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RotationWithoutGenerator)
        ));
    }

    #[test]
    fn rotation_with_generator_enabled_is_accepted() {
        let mut config = ReceiverConfig::new(37373, "/tmp/out", "desk");
        config.pair_ttl_seconds = Some(300);
        config.generate_pair_code = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn conflicting_tls_trust_flags_are_rejected() {
        let mut config = SenderConfig::new("192.168.1.5", 37373);
        config.tls = Some(TlsClientConfig {
            enabled: true,
            insecure: true,
            fingerprint: Some("ab".into()),
            trust_on_first_use: false,
            known_hosts_path: None,
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingTlsTrust)
        ));
    }

    #[test]
    fn single_tls_trust_flag_is_accepted() {
        let mut config = SenderConfig::new("192.168.1.5", 37373);
        config.tls = Some(TlsClientConfig {
            enabled: true,
            insecure: false,
            fingerprint: Some("ab".into()),
            trust_on_first_use: false,
            known_hosts_path: None,
        });
        assert!(config.validate().is_ok());
    }
}
