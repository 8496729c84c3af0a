//! Discrete Laplace-Beltrami operators built from the mesh triangles.

use crate::model::types::Point;
use nalgebra::Vector3;

/// Cotangent of the angle between `u` and `v`, or zero for degenerate corners.
fn cot(u: &Vector3<f64>, v: &Vector3<f64>) -> f64 {
    let sin = u.cross(v).norm();
    if sin <= f64::EPSILON {
        0.0
    } else {
        u.dot(v) / sin
    }
}

/// Cotangent Laplacian stored as sorted sparse rows.
///
/// The off-diagonal entry `(i, j)` is `(cot α + cot β) / 2`, where `α` and `β` are the angles
/// opposite edge `ij` in its incident triangles (a boundary edge has only one). Each diagonal
/// entry is minus the sum of its row, so the matrix is symmetric and annihilates constants.
#[derive(Debug, Clone, PartialEq)]
pub struct CotanLaplacian {
    rows: Vec<Vec<(usize, f64)>>,
    diagonal: Vec<f64>,
}

impl CotanLaplacian {
    pub(super) fn new(vertices: &[Point], faces: &[[usize; 3]], adjacency: &[Vec<usize>]) -> Self {
        let mut rows: Vec<Vec<(usize, f64)>> = adjacency
            .iter()
            .map(|nbrs| nbrs.iter().map(|&j| (j, 0.0)).collect())
            .collect();

        for f in faces {
            for k in 0..3 {
                let (i, j, o) = (f[(k + 1) % 3], f[(k + 2) % 3], f[k]);
                let half = 0.5 * cot(&(vertices[i] - vertices[o]), &(vertices[j] - vertices[o]));
                for (a, b) in [(i, j), (j, i)] {
                    if let Ok(slot) = rows[a].binary_search_by_key(&b, |&(n, _)| n) {
                        rows[a][slot].1 += half;
                    }
                }
            }
        }

        let diagonal = rows.iter().map(|row| -row.iter().map(|&(_, w)| w).sum::<f64>()).collect();
        Self { rows, diagonal }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    /// Off-diagonal entries of row `i`, ascending by column.
    pub fn row(&self, i: usize) -> &[(usize, f64)] {
        &self.rows[i]
    }

    /// Entry `(i, j)`; zero for vertices that share no edge.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        if i == j {
            return self.diagonal[i];
        }
        self.rows[i]
            .binary_search_by_key(&j, |&(n, _)| n)
            .map(|slot| self.rows[i][slot].1)
            .unwrap_or(0.0)
    }

    /// Matrix-vector product applied to each coordinate of `points`.
    pub fn apply(&self, points: &[Point]) -> Vec<Vector3<f64>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.iter()
                    .fold(Vector3::zeros(), |acc, &(j, w)| acc + w * (points[j] - points[i]))
            })
            .collect()
    }
}

/// Diagonal of the mixed Voronoi mass matrix.
///
/// Each vertex receives its Voronoi share of every non-obtuse incident triangle. In an obtuse
/// triangle the obtuse corner takes half of the area and the other two corners a quarter each.
/// The entries sum to the total surface area.
pub(super) fn voronoi_areas(vertices: &[Point], faces: &[[usize; 3]]) -> Vec<f64> {
    let mut areas = vec![0.0; vertices.len()];
    for f in faces {
        let p = [vertices[f[0]], vertices[f[1]], vertices[f[2]]];
        let area = 0.5 * (p[1] - p[0]).cross(&(p[2] - p[0])).norm();
        if area <= 0.0 {
            continue;
        }

        let obtuse = (0..3).find(|&k| {
            let u = p[(k + 1) % 3] - p[k];
            let v = p[(k + 2) % 3] - p[k];
            u.dot(&v) < 0.0
        });
        match obtuse {
            Some(k) => {
                for c in 0..3 {
                    areas[f[c]] += if c == k { area / 2.0 } else { area / 4.0 };
                }
            }
            None => {
                for k in 0..3 {
                    let (i, j) = ((k + 1) % 3, (k + 2) % 3);
                    // The share of corner k is bounded by its two edges and the
                    // perpendicular bisectors; the opposite angles weight each edge.
                    let cot_i = cot(&(p[k] - p[i]), &(p[j] - p[i]));
                    let cot_j = cot(&(p[k] - p[j]), &(p[i] - p[j]));
                    let share = ((p[j] - p[k]).norm_squared() * cot_i + (p[i] - p[k]).norm_squared() * cot_j) / 8.0;
                    areas[f[k]] += share;
                }
            }
        }
    }
    areas
}

#[cfg(test)]
mod tests {
    use crate::mesh::Mesh;
    use crate::mesh::tests::{strip, tetrahedron};
    use crate::model::types::Point;

    #[test]
    fn laplacian_is_symmetric_with_zero_row_sums() {
        let mesh = tetrahedron();
        let l = mesh.cot_matrix();

        assert_eq!(l.len(), 4);
        for i in 0..4 {
            let off: f64 = l.row(i).iter().map(|&(_, w)| w).sum();
            assert!((off + l.diagonal()[i]).abs() < 1e-12);
            for j in 0..4 {
                assert!((l.weight(i, j) - l.weight(j, i)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn laplacian_weights_follow_opposite_angles() {
        // Faces [0, 2, 1] and [1, 2, 3] of a unit square split along the 1-2 diagonal.
        let mesh = strip(1);
        let l = mesh.cot_matrix();

        // The diagonal faces two right angles; each side faces one 45 degree angle.
        assert!(l.weight(1, 2).abs() < 1e-12);
        assert!((l.weight(0, 1) - 0.5).abs() < 1e-12);
        assert!((l.weight(0, 2) - 0.5).abs() < 1e-12);
        assert_eq!(l.weight(0, 3), 0.0);
    }

    #[test]
    fn laplacian_of_planar_mesh_stays_in_plane() {
        let mesh = strip(3);
        for v in mesh.cot_matrix().apply(mesh.vertices()) {
            assert!(v.z.abs() < 1e-12);
        }
    }

    #[test]
    fn voronoi_areas_split_right_triangles() {
        let mesh = Mesh::new(
            vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0), Point::new(0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        )
        .unwrap();

        let mass = mesh.mass_matrix();
        assert!((mass[0] - 0.25).abs() < 1e-12);
        assert!((mass[1] - 0.125).abs() < 1e-12);
        assert!((mass[2] - 0.125).abs() < 1e-12);
    }

    #[test]
    fn voronoi_areas_handle_obtuse_triangles() {
        let mesh = Mesh::new(
            vec![Point::new(0.0, 0.0, 0.0), Point::new(-2.0, 0.1, 0.0), Point::new(2.0, 0.1, 0.0)],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let area = mesh.area();

        let mass = mesh.mass_matrix();
        assert!((mass[0] - area / 2.0).abs() < 1e-12);
        assert!((mass[1] - area / 4.0).abs() < 1e-12);
    }

    #[test]
    fn voronoi_areas_sum_to_surface_area() {
        for mesh in [tetrahedron(), strip(4)] {
            let total: f64 = mesh.mass_matrix().iter().sum();
            assert!((total - mesh.area()).abs() < 1e-12);
        }
    }
}
