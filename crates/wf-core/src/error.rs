use std::path::PathBuf;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while loading configuration or validating core values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A configuration document could not be read from disk.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration document is not valid JSON or does not match the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A configuration document parsed but holds out-of-range tunables.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An identifier was empty or contained only whitespace.
    #[error("invalid {kind} identifier: \"{value}\"")]
    InvalidId {
        /// The identifier kind (sector, faction, ...).
        kind: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A weather-state string is not part of the closed set.
    #[error("unknown weather state: \"{0}\"")]
    UnknownWeatherState(String),

    /// A crime-type string is not part of the closed set.
    #[error("unknown crime type: \"{0}\"")]
    UnknownCrimeType(String),

    /// A ship-type string is not part of the closed set.
    #[error("unknown ship type: \"{0}\"")]
    UnknownShipType(String),
}
