use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] crate::io::Error),

    #[error(transparent)]
    Mesh(#[from] crate::mesh::Error),

    #[error("array '{name}' in bundle '{bundle}' has shape {found:?}, expected {expected}")]
    ShapeMismatch {
        bundle: String,
        name: String,
        expected: String,
        found: Vec<usize>,
    },

    #[error("array '{name}' in bundle '{bundle}' holds {found}, expected {expected}")]
    TypeMismatch {
        bundle: String,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("bundle '{bundle}' has no array '{name}'")]
    MissingArray { bundle: String, name: String },
}

impl Error {
    pub fn shape_mismatch(
        bundle: impl Into<String>,
        name: impl Into<String>,
        expected: impl Into<String>,
        found: &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            bundle: bundle.into(),
            name: name.into(),
            expected: expected.into(),
            found: found.to_vec(),
        }
    }

    pub fn missing_array(bundle: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingArray {
            bundle: bundle.into(),
            name: name.into(),
        }
    }
}
