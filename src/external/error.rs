use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] crate::io::Error),

    #[error(transparent)]
    Mesh(#[from] crate::mesh::Error),

    #[error("invalid command for {tool}: {details}")]
    InvalidCommand { tool: &'static str, details: String },

    #[error("failed to launch {tool} ('{program}'): {source}")]
    Launch {
        tool: &'static str,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    Failed {
        tool: &'static str,
        status: String,
        stderr: String,
    },

    #[error("{tool} did not produce '{}'", path.display())]
    MissingOutput { tool: &'static str, path: PathBuf },

    #[error("failed to create a scratch directory: {source}")]
    Scratch {
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid_command(tool: &'static str, details: impl Into<String>) -> Self {
        Self::InvalidCommand {
            tool,
            details: details.into(),
        }
    }

    pub fn missing_output(tool: &'static str, path: impl Into<PathBuf>) -> Self {
        Self::MissingOutput {
            tool,
            path: path.into(),
        }
    }
}
