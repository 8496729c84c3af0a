use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown atom feature '{name}' (available: {available})")]
    UnknownFeature { name: String, available: String },

    #[error("feature '{name}' was provided more than once")]
    DuplicateFeature { name: String },

    #[error("feature '{name}' has {found} values, expected {expected} ({num_atoms} atoms x {width} columns)")]
    FeatureSizeMismatch {
        name: String,
        expected: usize,
        found: usize,
        num_atoms: usize,
        width: usize,
    },

    #[error("structure '{structure}' has no atoms usable for {purpose}")]
    NoAtoms { structure: String, purpose: String },

    #[error("invalid parameter '{parameter}': {details}")]
    InvalidParameter { parameter: String, details: String },

    #[error(transparent)]
    Mesh(#[from] crate::mesh::Error),
}

impl Error {
    pub fn unknown_feature<'a>(
        name: impl Into<String>,
        available: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self::UnknownFeature {
            name: name.into(),
            available: available.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    pub fn no_atoms(structure: impl Into<String>, purpose: impl Into<String>) -> Self {
        Self::NoAtoms {
            structure: structure.into(),
            purpose: purpose.into(),
        }
    }

    pub fn invalid_parameter(parameter: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            details: details.into(),
        }
    }
}
