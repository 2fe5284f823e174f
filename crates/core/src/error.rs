use thiserror::Error;

/// Invalid configuration caught before any connection is made or socket
/// bound (component: facade validation, called at the start of
/// [`crate::start_receiver`] and [`crate::send_entries`]).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("pair rotation requested but generate_pair_code is false")]
    RotationWithoutGenerator,

    #[error("insecure, fingerprint, and trust_on_first_use are mutually exclusive")]
    ConflictingTlsTrust,
}

/// The sum type collaborators of this crate match on. Every subsystem
/// error converts into one via `?`.
#[derive(Debug, Error)]
pub enum LandropError {
    #[error(transparent)]
    Transfer(#[from] transfer::TransferError),

    #[error(transparent)]
    Daemon(#[from] daemon::DaemonError),

    #[error(transparent)]
    Discovery(#[from] discovery::DiscoveryError),

    #[error(transparent)]
    Walk(#[from] walk::WalkError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
