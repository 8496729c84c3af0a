//! Operations over structures and meshes.
//!
//! Cleaning and entity splitting prepare a structure for surface generation. Surface geometry
//! descriptors, feature providers, the feature mapper, electrostatic sampling, and label
//! assignment turn a structure and its mesh into vertex-indexed arrays. All operations share
//! [`Error`].

mod clean;
mod electrostatics;
mod entities;
mod error;
mod features;
mod geometry;
mod labels;

pub use clean::{CleanConfig, clean_structure};
pub use electrostatics::{
    DEFAULT_PROBE_OFFSET, ELECTROSTATIC_FEATURES, FieldSampler, map_electrostatics_to_mesh,
};
pub use entities::{ChainKind, Entities, chain_kind, select_residues, split_entities};
pub use error::Error;
pub use features::{
    AreaMeasure, AtchleyFactors, AtomFeature, AtomFeatureProvider, AtomFeatureTable,
    CircularVariance, FeatureMatrix, HydrogenBondAtoms, Hydrophobicity, MapperConfig,
    SolventAccessibleArea, SpatialAggregation, default_feature_names, default_providers,
    map_atom_features_to_mesh,
};
pub use geometry::{GEOMETRY_FEATURES, geometry_features};
pub use labels::{LabelConfig, Labels, MASKED, assign_labels, smooth_labels};
