//! Atom-level features and their projection onto mesh vertices.
//!
//! Providers compute named per-atom column blocks ([`AtomFeature`]) over a structure; the
//! blocks are gathered into an [`AtomFeatureTable`] whose rows follow
//! `Structure::iter_atoms` order. The mapper then interpolates a selection of those blocks
//! onto the vertices of a mesh, producing a [`FeatureMatrix`].

mod area;
mod mapper;
mod providers;

pub use area::{AreaMeasure, SolventAccessibleArea, SpatialAggregation};
pub use mapper::{MapperConfig, map_atom_features_to_mesh};
pub use providers::{
    AtchleyFactors, CircularVariance, HydrogenBondAtoms, Hydrophobicity, default_providers,
    default_feature_names,
};

use crate::model::structure::Structure;
use crate::ops::error::Error;
use ndarray::{Array2, Axis, concatenate};
use std::collections::HashSet;

/// A named block of `width` values per atom, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomFeature {
    pub name: String,
    pub width: usize,
    pub values: Vec<f64>,
}

impl AtomFeature {
    pub fn scalar(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            width: 1,
            values,
        }
    }

    pub fn vector(name: impl Into<String>, width: usize, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            width,
            values,
        }
    }

    /// Column names: the feature name for scalars, `name_1..name_w` otherwise.
    pub fn column_names(&self) -> Vec<String> {
        if self.width == 1 {
            vec![self.name.clone()]
        } else {
            (1..=self.width).map(|k| format!("{}_{}", self.name, k)).collect()
        }
    }

    pub fn row(&self, atom: usize) -> &[f64] {
        &self.values[atom * self.width..(atom + 1) * self.width]
    }
}

/// Computes atom-level features for a structure.
pub trait AtomFeatureProvider: Send + Sync {
    /// Returns one or more feature blocks with one row per atom of `structure`.
    fn compute(&self, structure: &Structure) -> Result<Vec<AtomFeature>, Error>;
}

/// Feature blocks sharing one atom indexing.
#[derive(Debug, Clone, Default)]
pub struct AtomFeatureTable {
    num_atoms: usize,
    features: Vec<AtomFeature>,
}

impl AtomFeatureTable {
    pub fn new(num_atoms: usize) -> Self {
        Self {
            num_atoms,
            features: Vec::new(),
        }
    }

    /// Runs every provider against `structure` and collects the results.
    pub fn compute(
        structure: &Structure,
        providers: &[Box<dyn AtomFeatureProvider>],
    ) -> Result<Self, Error> {
        let mut table = Self::new(structure.atom_count());
        for provider in providers {
            for feature in provider.compute(structure)? {
                table.insert(feature)?;
            }
        }
        Ok(table)
    }

    /// Adds a feature block after validating its size and name.
    pub fn insert(&mut self, feature: AtomFeature) -> Result<(), Error> {
        if self.get(&feature.name).is_some() {
            return Err(Error::DuplicateFeature { name: feature.name });
        }
        let expected = self.num_atoms * feature.width;
        if feature.width == 0 || feature.values.len() != expected {
            return Err(Error::FeatureSizeMismatch {
                expected,
                found: feature.values.len(),
                num_atoms: self.num_atoms,
                width: feature.width,
                name: feature.name,
            });
        }
        self.features.push(feature);
        Ok(())
    }

    pub fn num_atoms(&self) -> usize {
        self.num_atoms
    }

    pub fn get(&self, name: &str) -> Option<&AtomFeature> {
        self.features.iter().find(|f| f.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }
}

/// Vertex-indexed feature matrix with one name per column.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self, Error> {
        if names.len() != values.ncols() {
            return Err(Error::invalid_parameter(
                "feature_names",
                format!("{} names for {} columns", names.len(), values.ncols()),
            ));
        }
        let unique: HashSet<&str> = names.iter().map(String::as_str).collect();
        if unique.len() != names.len() {
            return Err(Error::invalid_parameter("feature_names", "column names must be unique"));
        }
        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn num_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn num_columns(&self) -> usize {
        self.values.ncols()
    }

    pub fn into_parts(self) -> (Vec<String>, Array2<f64>) {
        (self.names, self.values)
    }

    /// Appends the columns of `other` to the right of `self`.
    pub fn hstack(self, other: FeatureMatrix) -> Result<Self, Error> {
        if self.num_rows() != other.num_rows() {
            return Err(Error::invalid_parameter(
                "features",
                format!(
                    "cannot join matrices with {} and {} rows",
                    self.num_rows(),
                    other.num_rows()
                ),
            ));
        }
        let values = concatenate(Axis(1), &[self.values.view(), other.values.view()])
            .map_err(|e| Error::invalid_parameter("features", e.to_string()))?;
        let mut names = self.names;
        names.extend(other.names);
        Self::new(names, values)
    }
}
