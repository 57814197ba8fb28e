//! Settings persistence errors.

use std::path::PathBuf;

/// Errors from loading or persisting the subdivision settings file.
///
/// The read/write/parse variants carry the path of the offending file so
/// hosts juggling several config directories can report which one failed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("failed to read settings from {path}")]
    Read {
        /// Path of the settings file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file or its directory could not be written.
    #[error("failed to write settings to {path}")]
    Write {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid RON for this schema.
    #[error("malformed settings file {path}")]
    Parse {
        /// Path of the settings file.
        path: PathBuf,
        /// RON parse error with position information.
        source: ron::error::SpannedError,
    },

    /// The in-memory settings could not be serialized.
    #[error("failed to serialize settings")]
    Serialize(#[from] ron::Error),
}
