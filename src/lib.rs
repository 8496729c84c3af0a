//! # Surface Forge
//!
//! **Surface Forge** turns macromolecular structures into per-vertex training data on their molecular surfaces. For every structure it triangulates (or reuses) a surface, maps geometric, physicochemical, and electrostatic atom properties onto the vertices, assigns supervised binding-site labels from a reference entity, and keeps the results in an incrementally updated NPZ bundle.
//!
//! ## Features
//!
//! - **Structure model** – Lightweight `Atom`, `Residue`, `Chain`, and `Structure` types backed by `nalgebra`, with a PDB reader that normalises residue aliases and alternate locations.
//! - **Surface meshes** – `Mesh` validates triangulations, keeps the largest connected component, and exposes normals, adjacency, fixed-radius vertex queries, and memoized cotangent Laplacian, Voronoi mass, and convex hull operators.
//! - **Feature mapping** – Surface curvature and convex-hull depth, atom-level providers (solvent accessible area, aggregation propensity, circular variance, hydrogen-bond roles, hydrophobicity, Atchley factors) interpolated onto vertices by inverse-distance weighting, plus electrostatic potential sampling from OpenDX grids.
//! - **Deterministic labels** – `AtomClassifier` rule sets with first-match-wins priority drive nearest-atom labelling, optional masking bands, and majority-vote smoothing.
//! - **Incremental bundles** – `bundle::RefreshPlan` recomputes only the missing or invalidated groups and writes archives atomically, preserving unrelated arrays.
//! - **Pluggable tools** – Surface generation and electrostatics sit behind the `external::MeshGenerator` and `external::ElectrostaticsSolver` traits, with command-line backed defaults.

mod db;
mod model;
mod utils;

pub mod bundle;
pub mod classify;
pub mod external;
pub mod io;
pub mod mesh;
pub mod ops;
pub mod pipeline;

pub use classify::AtomClassifier;
pub use mesh::Mesh;
pub use model::atom::Atom;
pub use model::chain::Chain;
pub use model::residue::Residue;
pub use model::structure::Structure;
pub use model::types::{Element, Point, ResidueCategory, StandardResidue};
