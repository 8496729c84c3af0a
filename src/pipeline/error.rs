use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration{}: {details}", path.as_ref().map(|p| format!(" '{}'", p.display())).unwrap_or_default())]
    Config {
        path: Option<PathBuf>,
        details: String,
    },

    #[error(transparent)]
    Classifier(#[from] crate::classify::Error),

    #[error(transparent)]
    Io(#[from] crate::io::Error),

    #[error(transparent)]
    Mesh(#[from] crate::mesh::Error),

    #[error(transparent)]
    Ops(#[from] crate::ops::Error),

    #[error(transparent)]
    Bundle(#[from] crate::bundle::Error),

    #[error(transparent)]
    External(#[from] crate::external::Error),

    #[error("failed to write manifest '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn config(path: Option<&std::path::Path>, details: impl Into<String>) -> Self {
        Self::Config {
            path: path.map(|p| p.to_path_buf()),
            details: details.into(),
        }
    }

    /// Whether the error invalidates the whole run rather than a single structure.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Classifier(_) | Self::Manifest { .. }
        )
    }
}
