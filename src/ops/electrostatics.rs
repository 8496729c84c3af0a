//! Sampling of electrostatic fields at mesh vertices.

use crate::io::ScalarGrid;
use crate::mesh::Mesh;
use crate::model::types::Point;
use crate::ops::error::Error;
use crate::ops::features::FeatureMatrix;
use crate::utils::parallel::map_indexed;
use ndarray::Array2;

/// A scalar field that can be evaluated at arbitrary points.
pub trait FieldSampler: Send + Sync {
    fn sample(&self, point: &Point) -> f64;
}

impl FieldSampler for ScalarGrid {
    fn sample(&self, point: &Point) -> f64 {
        self.interpolate(point)
    }
}

/// Column names produced by [`map_electrostatics_to_mesh`].
pub const ELECTROSTATIC_FEATURES: [&str; 2] = ["pot", "acc"];

/// Probe offset along the vertex normal used for the potential, in ångströms.
pub const DEFAULT_PROBE_OFFSET: f64 = 1.0;

/// Samples the potential and the solvent accessibility at every vertex.
///
/// The potential `pot` is read at `vertex + offset * normal`, just outside the surface where
/// the solver resolves it cleanly. The accessibility `acc` is read at the vertex itself.
pub fn map_electrostatics_to_mesh(
    mesh: &Mesh,
    potential: &dyn FieldSampler,
    accessibility: &dyn FieldSampler,
    offset: f64,
) -> Result<FeatureMatrix, Error> {
    if !offset.is_finite() {
        return Err(Error::invalid_parameter("offset", "must be finite"));
    }

    let normals = mesh.vertex_normals();
    let samples = map_indexed(mesh.num_vertices(), |v| {
        let vertex = mesh.vertices()[v];
        let probe = vertex + normals[v] * offset;
        (potential.sample(&probe), accessibility.sample(&vertex))
    });

    let mut values = Array2::zeros((mesh.num_vertices(), 2));
    for (v, (pot, acc)) in samples.into_iter().enumerate() {
        values[[v, 0]] = pot;
        values[[v, 1]] = acc;
    }
    FeatureMatrix::new(
        ELECTROSTATIC_FEATURES.iter().map(|s| s.to_string()).collect(),
        values,
    )
}
