use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] crate::io::Error),

    #[error("mesh is empty: {details}")]
    Empty { details: String },

    #[error("face {face} references vertex {index}, but the mesh has {num_vertices} vertices")]
    InvalidFace {
        face: usize,
        index: usize,
        num_vertices: usize,
    },

    #[error("vertex {index} has a non-finite coordinate")]
    InvalidVertex { index: usize },

    #[error("vertex {index} is out of range for a mesh with {num_vertices} vertices")]
    VertexOutOfRange { index: usize, num_vertices: usize },
}

impl Error {
    pub fn empty(details: impl Into<String>) -> Self {
        Self::Empty {
            details: details.into(),
        }
    }
}
