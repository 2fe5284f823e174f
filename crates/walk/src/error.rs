use std::path::PathBuf;

use thiserror::Error;

/// Errors from expanding an input path into transfer entries.
#[derive(Debug, Error)]
pub enum WalkError {
    /// The input directory (or a directory reached while recursing)
    /// contained no regular files at all.
    #[error("{0} contains no files to send")]
    EmptyDirectory(PathBuf),

    /// The input path is neither a regular file nor a directory.
    #[error("{0} is not a regular file or directory")]
    NotRegularOrDirectory(PathBuf),

    /// A filesystem operation failed while walking.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
