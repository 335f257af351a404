//! Error types shared across the configuration subsystems.

use thiserror::Error;

use crate::remote::FetchError;

/// Errors that can occur while resolving or querying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A named source could not be found as a file or a bundled resource.
    #[error("config source not found: {name}")]
    SourceNotFound { name: String },

    /// Reading an existing source failed.
    #[error("failed to read config source {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A source exists but its contents could not be parsed.
    #[error("failed to parse config source {name}: {message}")]
    Parse { name: String, message: String },

    /// Substitution resolution revisited a key already being resolved.
    #[error("cyclic reference while resolving substitutions: {}", chain.join(" -> "))]
    CyclicReference { chain: Vec<String> },

    /// A required `${...}` reference names a key that exists nowhere.
    #[error("unresolved reference ${{{reference}}} in value of {key}")]
    UnresolvedReference { key: String, reference: String },

    /// A value exists but cannot be interpreted as the expected type.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// A strict lookup found no value for the key.
    #[error("missing config key: {key}")]
    MissingKey { key: String },

    /// The synchronous first fetch of the dynamic layer failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
