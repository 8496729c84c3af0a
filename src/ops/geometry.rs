//! Intrinsic shape descriptors of the surface itself.

use crate::mesh::Mesh;
use crate::ops::error::Error;
use crate::ops::features::FeatureMatrix;
use crate::utils::parallel::map_indexed;
use ndarray::Array2;
use std::f64::consts::PI;

/// Column names produced by [`geometry_features`].
pub const GEOMETRY_FEATURES: [&str; 5] = [
    "mean_curvature",
    "gaussian_curvature",
    "shape_index",
    "curvedness",
    "hull_distance",
];

/// Per-vertex curvature descriptors and depth below the convex hull.
///
/// Mean curvature comes from the cotangent Laplacian, `H = -(L x)·n / 2A`, and Gaussian
/// curvature from the angle defect, `K = (2π - Σθ) / A`, with `A` the Voronoi area of the
/// vertex. Both are zero on the boundary and at vertices without area. Principal curvatures
/// `k1 >= k2` follow from `H ± sqrt(max(H² - K, 0))` and give the shape index
/// `(2/π) atan2(k1 + k2, k1 - k2)` and the curvedness `sqrt((k1² + k2²) / 2)`. The hull
/// distance is zero for meshes that do not enclose a volume.
pub fn geometry_features(mesh: &Mesh) -> Result<FeatureMatrix, Error> {
    let n = mesh.num_vertices();
    let vertices = mesh.vertices();
    let normals = mesh.vertex_normals();
    let mass = mesh.mass_matrix();
    let laplace = mesh.cot_matrix().apply(vertices);
    let boundary = mesh.boundary_vertices();
    let hull = mesh.convex_hull();

    let mut angle_sums = vec![0.0; n];
    for f in mesh.faces() {
        for k in 0..3 {
            let u = vertices[f[(k + 1) % 3]] - vertices[f[k]];
            let v = vertices[f[(k + 2) % 3]] - vertices[f[k]];
            angle_sums[f[k]] += u.cross(&v).norm().atan2(u.dot(&v));
        }
    }

    let rows = map_indexed(n, |i| {
        let (h, k) = if boundary[i] || mass[i] <= 0.0 {
            (0.0, 0.0)
        } else {
            (
                -laplace[i].dot(&normals[i]) / (2.0 * mass[i]),
                (2.0 * PI - angle_sums[i]) / mass[i],
            )
        };
        let spread = (h * h - k).max(0.0).sqrt();
        let (k1, k2) = (h + spread, h - spread);
        let shape_index = 2.0 / PI * (k1 + k2).atan2(k1 - k2);
        let curvedness = ((k1 * k1 + k2 * k2) / 2.0).sqrt();
        let depth = hull.map_or(0.0, |hull| hull.depth(&vertices[i]));
        [h, k, shape_index, curvedness, depth]
    });

    let mut values = Array2::zeros((n, GEOMETRY_FEATURES.len()));
    for (i, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            values[[i, c]] = value;
        }
    }
    FeatureMatrix::new(
        GEOMETRY_FEATURES.iter().map(|s| s.to_string()).collect(),
        values,
    )
}
