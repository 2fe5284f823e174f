use thiserror::Error;

/// Errors surfaced to the process exit path.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Landrop(#[from] core::LandropError),

    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
}
