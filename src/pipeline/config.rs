//! JSON run configuration.
//!
//! Keys are upper case with underscores, as in:
//!
//! ```json
//! {
//!     "PDB_FILES_PATH": "pdb",
//!     "MESH_FILES_PATH": "meshes",
//!     "FEATURE_DATA_PATH": "features",
//!     "ELECTROSTATICS_PATH": "electrostatics",
//!     "MESH_GENERATOR": "mesher --surface {surface_type} --skin {skin_parameter} --scale {grid_scale} {input} {output}",
//!     "SMOOTH_LABELS": true,
//!     "AREA_MEASURE": "sasa"
//! }
//! ```
//!
//! Unknown keys are ignored so one file can be shared with other tools.

use super::error::Error;
use crate::external::CommandSpec;
use crate::ops::AreaMeasure;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    /// Directory holding the structure files named in the list file.
    pub pdb_files_path: PathBuf,
    /// Directory of cached `<id>_mesh.off` files.
    pub mesh_files_path: PathBuf,
    /// Directory receiving bundles and adjacency artifacts.
    pub feature_data_path: PathBuf,
    /// Directory of cached `<id>_potential.dx` / `<id>_access.dx` grids.
    #[serde(default)]
    pub electrostatics_path: Option<PathBuf>,

    /// Keep hydrogens in the receptor and in feature mapping.
    #[serde(default)]
    pub hydrogens: bool,
    #[serde(default)]
    pub smooth_labels: bool,
    #[serde(default)]
    pub mask_labels: bool,
    #[serde(default = "defaults::label_distance_cutoff")]
    pub label_distance_cutoff: f64,
    #[serde(default = "defaults::label_mask_cutoff")]
    pub label_mask_cutoff: f64,
    #[serde(default = "defaults::feature_radius")]
    pub feature_radius: f64,
    /// Per-atom surface measure behind the area and aggregation features.
    #[serde(default)]
    pub area_measure: AreaMeasure,

    #[serde(default = "defaults::surface_type")]
    pub surface_type: String,
    #[serde(default = "defaults::skin_parameter")]
    pub skin_parameter: f64,
    #[serde(default = "defaults::grid_scale")]
    pub grid_scale: f64,

    /// Triangulation command; required only when a mesh has to be generated.
    #[serde(default)]
    pub mesh_generator: Option<CommandSpec>,
    #[serde(default)]
    pub pdb2pqr: Option<CommandSpec>,
    #[serde(default)]
    pub apbs: Option<CommandSpec>,
    #[serde(default = "defaults::force_field")]
    pub force_field: String,
}

mod defaults {
    pub fn label_distance_cutoff() -> f64 {
        4.0
    }
    pub fn label_mask_cutoff() -> f64 {
        0.5
    }
    pub fn feature_radius() -> f64 {
        3.0
    }
    pub fn surface_type() -> String {
        "skin".to_string()
    }
    pub fn skin_parameter() -> f64 {
        0.45
    }
    pub fn grid_scale() -> f64 {
        2.0
    }
    pub fn force_field() -> String {
        "AMBER".to_string()
    }
}

impl Config {
    /// Parses and validates a configuration file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(Some(path), format!("cannot read file: {}", e)))?;
        Self::from_json(&text).map_err(|e| match e {
            Error::Config { details, .. } => Error::config(Some(path), details),
            other => other,
        })
    }

    /// Parses and validates configuration text.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::config(None, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Directory for electrostatic grids, or a configuration error.
    pub fn electrostatics_dir(&self) -> Result<&Path, Error> {
        self.electrostatics_path
            .as_deref()
            .ok_or_else(|| Error::config(None, "ELECTROSTATICS_PATH is required when electrostatics are enabled"))
    }

    fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("FEATURE_RADIUS", self.feature_radius),
            ("SKIN_PARAMETER", self.skin_parameter),
            ("GRID_SCALE", self.grid_scale),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::config(None, format!("{} must be positive, got {}", key, value)));
            }
        }
        let non_negative = [
            ("LABEL_DISTANCE_CUTOFF", self.label_distance_cutoff),
            ("LABEL_MASK_CUTOFF", self.label_mask_cutoff),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(Error::config(None, format!("{} must be non-negative, got {}", key, value)));
            }
        }
        if self.surface_type.trim().is_empty() {
            return Err(Error::config(None, "SURFACE_TYPE must not be empty"));
        }
        Ok(())
    }
}
