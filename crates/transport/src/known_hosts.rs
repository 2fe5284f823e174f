use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::TransportError;

/// A `host:port → fingerprint` store backing trust-on-first-use mode.
///
/// Keys are kept sorted (via `BTreeMap`) so the persisted file is stable
/// and diff-friendly across rewrites.
#[derive(Debug, Default)]
pub struct KnownHosts {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl KnownHosts {
    /// The default path, `<home>/.local-sent/known_hosts.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".local-sent").join("known_hosts.json"))
    }

    /// Loads the store from `path`, treating a missing file as empty.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, TransportError> {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| TransportError::KnownHosts {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(TransportError::KnownHosts { path, source: e }),
        };
        Ok(Self { path, entries })
    }

    /// Checks `endpoint` (`host:port`) against the stored fingerprint.
    ///
    /// Returns `Ok(true)` when the fingerprint was newly recorded (a
    /// trust-on-first-use event the caller should log), `Ok(false)` when
    /// it matched an existing entry, and
    /// [`TransportError::FingerprintChanged`] when it conflicts with one.
    pub fn verify_or_record(
        &mut self,
        endpoint: &str,
        fingerprint: &str,
    ) -> Result<bool, TransportError> {
        match self.entries.get(endpoint) {
            Some(known) if known == fingerprint => Ok(false),
            Some(known) => Err(TransportError::FingerprintChanged {
                host: endpoint.to_string(),
                known: known.clone(),
                got: fingerprint.to_string(),
            }),
            None => {
                self.entries
                    .insert(endpoint.to_string(), fingerprint.to_string());
                info!(endpoint, fingerprint, "trust on first use: recording new TLS fingerprint");
                Ok(true)
            }
        }
    }

    /// Writes the store back to its path, creating parent directories as
    /// needed. Keys are serialized in sorted order since `entries` is a
    /// `BTreeMap`.
    pub fn save(&self) -> Result<(), TransportError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TransportError::KnownHosts {
                path: self.path.clone(),
                source: e,
            })?;
        }
        let mut json = serde_json::to_vec_pretty(&self.entries).map_err(|e| TransportError::KnownHosts {
            path: self.path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, e),
        })?;
        json.push(b'\n');
        std::fs::write(&self.path, json).map_err(|e| TransportError::KnownHosts {
            path: self.path.clone(),
            source: e,
        })
    }

    /// The path this store reads from and writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
