//! Seams to the external programs the pipeline drives.
//!
//! Surface triangulation and the electrostatics solve are opaque services behind the
//! [`MeshGenerator`] and [`ElectrostaticsSolver`] traits. The provided implementations launch
//! configurable command lines and exchange files through a per-structure [`Scratch`]
//! directory. Calls block until the program exits.

mod apbs;
mod command;
mod error;
mod mesh_gen;
mod scratch;

pub use apbs::{
    ApbsSolver, ElectrostaticsSolver, Potentials, discard_cached_potentials, load_cached_potentials,
    potential_paths,
};
pub use command::CommandSpec;
pub use error::Error;
pub use mesh_gen::{CommandMeshGenerator, MeshGenerator, MeshParameters};
pub use scratch::Scratch;
