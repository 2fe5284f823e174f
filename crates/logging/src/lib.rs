//! Logging and verbosity control, installed once by a binary's `main`.
//!
//! Library crates never install a subscriber themselves; they only emit
//! [`tracing`] events and let whichever binary links them decide how (and
//! whether) those events are rendered.

use std::sync::OnceLock;

use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Verbosity requested on the command line, before `RUST_LOG` overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Only warnings and errors.
    Quiet,
    /// Warnings, errors, and top-level progress (the default).
    Normal,
    /// Adds per-session informational detail.
    Verbose,
    /// Adds per-frame and per-chunk debug detail.
    Debug,
}

impl Verbosity {
    /// Maps a `-v` repeat count to a verbosity level, saturating at
    /// [`Verbosity::Debug`].
    #[must_use]
    pub fn from_occurrences(count: u8) -> Self {
        match count {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    fn level_filter(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::WARN,
            Self::Normal => LevelFilter::INFO,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Debug => LevelFilter::TRACE,
        }
    }
}

/// Errors installing the global tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// A subscriber was already installed (by this call or another crate).
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

static INIT: OnceLock<()> = OnceLock::new();

/// Installs a process-wide `tracing` subscriber writing to stderr.
///
/// `RUST_LOG`, if set, takes precedence over `verbosity` entirely (it is
/// parsed as a full [`EnvFilter`] directive string); otherwise the
/// subscriber is built from `verbosity` alone. Calling this more than once
/// returns [`LoggingError::AlreadyInitialized`] rather than panicking.
pub fn init_tracing(verbosity: Verbosity) -> Result<(), LoggingError> {
    if INIT.get().is_some() {
        return Err(LoggingError::AlreadyInitialized);
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.level_filter().to_string()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggingError::AlreadyInitialized)?;
    let _ = INIT.set(());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn occurrence_counts_saturate_at_debug() {
        assert_eq!(Verbosity::from_occurrences(0), Verbosity::Normal);
        assert_eq!(Verbosity::from_occurrences(1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_occurrences(5), Verbosity::Debug);
    }

    #[test]
    fn verbosity_orders_from_quiet_to_debug() {
        assert!(Verbosity::Quiet < Verbosity::Normal);
        assert!(Verbosity::Normal < Verbosity::Verbose);
        assert!(Verbosity::Verbose < Verbosity::Debug);
    }
}
