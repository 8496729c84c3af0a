use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors raised while building an atom classifier.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid classifier configuration: {details}")]
    Configuration { details: String },

    #[error("invalid pattern '{pattern}' for class '{class}': {source}")]
    InvalidPattern {
        class: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read classifier file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse classifier file '{}': {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn configuration(details: impl Into<String>) -> Self {
        Self::Configuration {
            details: details.into(),
        }
    }

    pub fn invalid_pattern(
        class: impl Into<String>,
        pattern: impl Into<String>,
        source: regex::Error,
    ) -> Self {
        Self::InvalidPattern {
            class: class.into(),
            pattern: pattern.into(),
            source,
        }
    }
}
