//! Error types for configuration loading.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file: {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json at {path}: {source}")]
    ParseJson {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid toml at {path}: {source}")]
    ParseToml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A recipe entry could not be turned into an operation.
    #[error("invalid recipe for {zone} (operation {index}): {message}")]
    InvalidRecipe {
        zone: String,
        index: usize,
        message: String,
    },

    /// A configuration file has the wrong overall shape.
    #[error("invalid configuration: {0}")]
    Shape(String),

    /// A zone named on the command line is not configured.
    #[error("unknown zone: {0}")]
    UnknownZone(String),
}
