//! Core data structures modeling biological macromolecules.
//!
//! This module defines the atom/residue/chain/structure hierarchy consumed by the surface
//! pipeline, together with the uniform spatial [`grid::Grid`] that backs every distance query
//! over atoms and mesh vertices.

pub mod atom;
pub mod chain;
pub mod grid;
pub mod residue;
pub mod structure;
pub mod types;
