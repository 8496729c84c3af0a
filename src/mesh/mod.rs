//! Read-only triangle mesh with memoized derived data and spatial queries.
//!
//! A [`Mesh`] is immutable after construction. Construction validates face indices and keeps
//! only the largest connected component. Derived data (normals, adjacency, incidence, the
//! spatial index, the cotangent Laplacian, the Voronoi mass matrix and the convex hull) is
//! computed on first access and cached for the lifetime of the mesh.

mod components;
mod error;
mod hull;
mod operators;

pub use error::Error;
pub use hull::ConvexHull;
pub use operators::CotanLaplacian;

use crate::io;
use crate::model::grid::Grid;
use crate::model::types::Point;
use nalgebra::Vector3;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::OnceLock;

/// Side length of the cells used to bin vertices for spatial queries, in ångströms.
const VERTEX_GRID_CELL: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct Mesh {
    vertices: Vec<Point>,
    faces: Vec<[usize; 3]>,
    normals: OnceLock<Vec<Vector3<f64>>>,
    adjacency: OnceLock<Vec<Vec<usize>>>,
    vertex_faces: OnceLock<Vec<Vec<usize>>>,
    grid: OnceLock<Grid<usize>>,
    laplacian: OnceLock<CotanLaplacian>,
    mass: OnceLock<Vec<f64>>,
    hull: OnceLock<Option<ConvexHull>>,
}

impl Mesh {
    /// Builds a mesh from raw vertex and triangle arrays.
    ///
    /// Every coordinate must be finite.
    /// Faces that repeat a vertex are discarded. Every remaining face index must address a
    /// vertex. Disconnected fragments are then pruned so only the largest connected component
    /// remains.
    pub fn new(vertices: Vec<Point>, faces: Vec<[usize; 3]>) -> Result<Self, Error> {
        if let Some(index) = vertices
            .iter()
            .position(|p| !p.iter().all(|c| c.is_finite()))
        {
            return Err(Error::InvalidVertex { index });
        }
        let num_vertices = vertices.len();
        for (face, f) in faces.iter().enumerate() {
            if let Some(&index) = f.iter().find(|&&i| i >= num_vertices) {
                return Err(Error::InvalidFace {
                    face,
                    index,
                    num_vertices,
                });
            }
        }

        let total_faces = faces.len();
        let faces: Vec<[usize; 3]> = faces
            .into_iter()
            .filter(|f| f[0] != f[1] && f[1] != f[2] && f[0] != f[2])
            .collect();
        if faces.len() < total_faces {
            log::debug!("discarded {} degenerate faces", total_faces - faces.len());
        }
        if faces.is_empty() {
            return Err(Error::empty(format!(
                "no valid triangles among {} faces",
                total_faces
            )));
        }

        let pruned = components::keep_largest_component(vertices, faces);
        if pruned.dropped_components > 0 {
            log::debug!(
                "pruned {} vertices in {} disconnected fragments",
                pruned.dropped_vertices,
                pruned.dropped_components
            );
        }

        Ok(Self {
            vertices: pruned.vertices,
            faces: pruned.faces,
            normals: OnceLock::new(),
            adjacency: OnceLock::new(),
            vertex_faces: OnceLock::new(),
            grid: OnceLock::new(),
            laplacian: OnceLock::new(),
            mass: OnceLock::new(),
            hull: OnceLock::new(),
        })
    }

    /// Loads a mesh from an OFF file.
    pub fn load_off(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|e| io::Error::from_io(e, Some(path.to_path_buf())))?;
        let data = io::read_off_mesh(BufReader::new(file)).map_err(|e| e.with_path(path))?;
        Self::new(data.vertices, data.faces)
    }

    /// Writes the mesh to an OFF file, replacing any existing file.
    pub fn save_off(&self, path: &Path) -> Result<(), Error> {
        let file = File::create(path).map_err(|e| io::Error::from_io(e, Some(path.to_path_buf())))?;
        io::write_off_mesh(BufWriter::new(file), &self.vertices, &self.faces)
            .map_err(|e| e.with_path(path))?;
        Ok(())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Number of distinct undirected edges.
    pub fn num_edges(&self) -> usize {
        self.adjacency().iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Undirected edges as `(i, j)` pairs with `i < j`, ordered by `i` then `j`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.adjacency()
            .iter()
            .enumerate()
            .flat_map(|(i, nbrs)| nbrs.iter().filter(move |&&j| j > i).map(move |&j| (i, j)))
    }

    /// Unnormalized face normal; its length is twice the triangle area.
    fn face_cross(&self, f: &[usize; 3]) -> Vector3<f64> {
        let a = self.vertices[f[0]];
        let b = self.vertices[f[1]];
        let c = self.vertices[f[2]];
        (b - a).cross(&(c - a))
    }

    /// Unit face normals following the counter-clockwise winding of each face.
    pub fn face_normals(&self) -> Vec<Vector3<f64>> {
        self.faces
            .iter()
            .map(|f| self.face_cross(f).try_normalize(0.0).unwrap_or_else(Vector3::zeros))
            .collect()
    }

    pub fn face_areas(&self) -> Vec<f64> {
        self.faces.iter().map(|f| 0.5 * self.face_cross(f).norm()).collect()
    }

    /// Total surface area.
    pub fn area(&self) -> f64 {
        self.face_areas().iter().sum()
    }

    /// Area-weighted unit vertex normals.
    ///
    /// Vertices whose incident face normals cancel out get a zero vector.
    pub fn vertex_normals(&self) -> &[Vector3<f64>] {
        self.normals.get_or_init(|| {
            let mut acc = vec![Vector3::zeros(); self.vertices.len()];
            for f in &self.faces {
                let n = self.face_cross(f);
                for &v in f {
                    acc[v] += n;
                }
            }
            acc.into_iter()
                .map(|n| n.try_normalize(1e-12).unwrap_or_else(Vector3::zeros))
                .collect()
        })
    }

    /// Sorted neighbour lists of the vertex adjacency graph.
    pub fn adjacency(&self) -> &[Vec<usize>] {
        self.adjacency.get_or_init(|| {
            let mut sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); self.vertices.len()];
            for f in &self.faces {
                for (a, b) in [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])] {
                    sets[a].insert(b);
                    sets[b].insert(a);
                }
            }
            sets.into_iter().map(|s| s.into_iter().collect()).collect()
        })
    }

    /// Indices of the faces incident to each vertex, ascending.
    pub fn vertex_faces(&self) -> &[Vec<usize>] {
        self.vertex_faces.get_or_init(|| {
            let mut incidence = vec![Vec::new(); self.vertices.len()];
            for (fi, f) in self.faces.iter().enumerate() {
                for &v in f {
                    incidence[v].push(fi);
                }
            }
            incidence
        })
    }

    /// Cotangent Laplacian over the vertex adjacency graph.
    pub fn cot_matrix(&self) -> &CotanLaplacian {
        self.laplacian
            .get_or_init(|| CotanLaplacian::new(&self.vertices, &self.faces, self.adjacency()))
    }

    /// Diagonal of the mixed Voronoi mass matrix: the surface area attributed to each vertex.
    pub fn mass_matrix(&self) -> &[f64] {
        self.mass
            .get_or_init(|| operators::voronoi_areas(&self.vertices, &self.faces))
    }

    /// Convex hull of the vertices; `None` for flat or degenerate meshes.
    pub fn convex_hull(&self) -> Option<&ConvexHull> {
        self.hull.get_or_init(|| ConvexHull::new(&self.vertices)).as_ref()
    }

    /// Vertices lying on an edge that belongs to a single face.
    pub fn boundary_vertices(&self) -> Vec<bool> {
        let mut counts: HashMap<(usize, usize), usize> = HashMap::new();
        for f in &self.faces {
            for (a, b) in [(f[0], f[1]), (f[1], f[2]), (f[2], f[0])] {
                *counts.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        let mut boundary = vec![false; self.vertices.len()];
        for ((a, b), _) in counts.into_iter().filter(|&(_, n)| n == 1) {
            boundary[a] = true;
            boundary[b] = true;
        }
        boundary
    }

    fn grid(&self) -> &Grid<usize> {
        self.grid.get_or_init(|| {
            Grid::new(
                self.vertices.iter().enumerate().map(|(i, p)| (*p, i)),
                VERTEX_GRID_CELL,
            )
        })
    }

    /// Closest vertex to `point` and its distance; equidistant vertices resolve to the lower
    /// index.
    pub fn nearest_vertex(&self, point: &Point) -> Option<(usize, f64)> {
        self.grid().nearest(point).map(|hit| (*hit.item, hit.distance))
    }

    /// All vertices within `radius` of `point` (inclusive), in ascending index order, with
    /// their distances.
    pub fn vertices_in_ball(&self, point: &Point, radius: f64) -> (Vec<usize>, Vec<f64>) {
        let mut hits: Vec<(usize, f64)> = self
            .grid()
            .within(point, radius)
            .map(|hit| (*hit.item, hit.distance))
            .collect();
        hits.sort_unstable_by_key(|(i, _)| *i);
        hits.into_iter().unzip()
    }

    /// Indices of all faces incident to any vertex within `radius` of `point`, ascending.
    pub fn faces_in_ball(&self, point: &Point, radius: f64) -> Vec<usize> {
        let (indices, _) = self.vertices_in_ball(point, radius);
        let incidence = self.vertex_faces();
        let faces: BTreeSet<usize> = indices
            .iter()
            .flat_map(|&v| incidence[v].iter().copied())
            .collect();
        faces.into_iter().collect()
    }

    /// Vertices reachable from `vertex` within `k` adjacency hops, excluding `vertex` itself.
    ///
    /// The traversal is a breadth-first search with an explicit frontier, so its depth is
    /// bounded only by `k`.
    pub fn find_neighbors(&self, vertex: usize, k: usize) -> Result<BTreeSet<usize>, Error> {
        if vertex >= self.vertices.len() {
            return Err(Error::VertexOutOfRange {
                index: vertex,
                num_vertices: self.vertices.len(),
            });
        }

        let adjacency = self.adjacency();
        let mut visited: HashSet<usize> = HashSet::from([vertex]);
        let mut frontier = vec![vertex];

        for _ in 0..k {
            let mut next = Vec::new();
            for &v in &frontier {
                for &n in &adjacency[v] {
                    if visited.insert(n) {
                        next.push(n);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        visited.remove(&vertex);
        Ok(visited.into_iter().collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Regular tetrahedron-like mesh with outward winding.
    pub(crate) fn tetrahedron() -> Mesh {
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
        Mesh::new(vertices, faces).unwrap()
    }

    /// Triangulated strip of `n` quads along x: vertices (i, 0, 0) and (i, 1, 0).
    pub(crate) fn strip(n: usize) -> Mesh {
        let mut vertices = Vec::new();
        for i in 0..=n {
            vertices.push(Point::new(i as f64, 0.0, 0.0));
            vertices.push(Point::new(i as f64, 1.0, 0.0));
        }
        let mut faces = Vec::new();
        for i in 0..n {
            let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
            faces.push([a, c, b]);
            faces.push([b, c, d]);
        }
        Mesh::new(vertices, faces).unwrap()
    }

    #[test]
    fn tetrahedron_counts() {
        let mesh = tetrahedron();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_edges(), 6);
        assert_eq!(mesh.edges().count(), 6);
    }

    #[test]
    fn new_rejects_out_of_range_faces() {
        let err = Mesh::new(vec![Point::origin(); 3], vec![[0, 1, 3]]).unwrap_err();
        assert!(matches!(err, Error::InvalidFace { index: 3, .. }));
    }

    #[test]
    fn new_rejects_non_finite_vertices() {
        let mut vertices: Vec<Point> = tetrahedron().vertices().to_vec();
        vertices[2].y = f64::NAN;
        let faces = vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];

        assert!(matches!(
            Mesh::new(vertices, faces),
            Err(Error::InvalidVertex { index: 2 })
        ));
    }

    #[test]
    fn new_rejects_meshes_without_triangles() {
        assert!(matches!(
            Mesh::new(vec![Point::origin(); 3], vec![[0, 0, 1]]),
            Err(Error::Empty { .. })
        ));
        assert!(matches!(Mesh::new(Vec::new(), Vec::new()), Err(Error::Empty { .. })));
    }

    #[test]
    fn new_keeps_largest_component() {
        let mut vertices: Vec<Point> = tetrahedron().vertices().to_vec();
        vertices.extend([
            Point::new(10.0, 0.0, 0.0),
            Point::new(11.0, 0.0, 0.0),
            Point::new(10.0, 1.0, 0.0),
        ]);
        let faces = vec![[4, 5, 6], [0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
        let mesh = Mesh::new(vertices, faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 4);
        assert_eq!(mesh.num_edges(), 6);
    }

    #[test]
    fn adjacency_is_symmetric_and_sorted() {
        let mesh = strip(3);
        let adjacency = mesh.adjacency();

        for (i, nbrs) in adjacency.iter().enumerate() {
            assert!(nbrs.windows(2).all(|w| w[0] < w[1]));
            for &j in nbrs {
                assert!(adjacency[j].contains(&i));
                assert_ne!(i, j);
            }
        }
    }

    #[test]
    fn find_neighbors_one_hop_equals_adjacency() {
        let mesh = strip(4);

        for v in 0..mesh.num_vertices() {
            let one_hop: Vec<usize> = mesh.find_neighbors(v, 1).unwrap().into_iter().collect();
            assert_eq!(one_hop, mesh.adjacency()[v]);
            assert!(!one_hop.contains(&v));
        }
    }

    #[test]
    fn find_neighbors_expands_with_hops() {
        let mesh = strip(4);

        assert!(mesh.find_neighbors(0, 0).unwrap().is_empty());
        let two_hop = mesh.find_neighbors(0, 2).unwrap();
        assert!(two_hop.contains(&4));
        assert!(!two_hop.contains(&0));
        let everything = mesh.find_neighbors(0, 100).unwrap();
        assert_eq!(everything.len(), mesh.num_vertices() - 1);
    }

    #[test]
    fn find_neighbors_rejects_unknown_vertex() {
        let mesh = tetrahedron();
        assert!(matches!(
            mesh.find_neighbors(4, 1),
            Err(Error::VertexOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn vertex_normals_point_outward() {
        let mesh = tetrahedron();
        let normals = mesh.vertex_normals();
        let centroid = Point::new(0.25, 0.25, 0.25);

        for (v, n) in mesh.vertices().iter().zip(normals) {
            assert!((n.norm() - 1.0).abs() < 1e-12);
            assert!(n.dot(&(v - centroid)) > 0.0);
        }
    }

    #[test]
    fn face_geometry() {
        let mesh = strip(2);

        assert!((mesh.area() - 2.0).abs() < 1e-12);
        for n in mesh.face_normals() {
            assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-12);
        }
    }

    #[test]
    fn nearest_vertex_prefers_lower_index_on_ties() {
        let mesh = strip(2);

        let (index, distance) = mesh.nearest_vertex(&Point::new(0.5, 0.0, 0.0)).unwrap();
        assert_eq!(index, 0);
        assert!((distance - 0.5).abs() < 1e-12);

        let (far, _) = mesh.nearest_vertex(&Point::new(50.0, 1.0, 0.0)).unwrap();
        assert_eq!(far, 5);
    }

    #[test]
    fn ball_queries_return_sorted_indices() {
        let mesh = strip(3);

        let (indices, distances) = mesh.vertices_in_ball(&Point::new(1.0, 0.0, 0.0), 1.0);
        assert_eq!(indices, vec![0, 2, 3, 4]);
        assert!((distances[0] - 1.0).abs() < 1e-12);
        assert!((distances[1] - 0.0).abs() < 1e-12);

        let faces = mesh.faces_in_ball(&Point::new(0.0, 0.0, 0.0), 0.1);
        assert_eq!(faces, vec![0]);
    }

    #[test]
    fn boundary_vertices_of_open_and_closed_meshes() {
        assert!(tetrahedron().boundary_vertices().iter().all(|b| !b));
        assert!(strip(3).boundary_vertices().iter().all(|&b| b));
    }

    #[test]
    fn convex_hull_is_memoized() {
        let mesh = tetrahedron();
        let first = mesh.convex_hull().unwrap() as *const ConvexHull;
        assert_eq!(mesh.convex_hull().unwrap().num_facets(), 4);
        assert!(std::ptr::eq(first, mesh.convex_hull().unwrap()));
        assert!(strip(2).convex_hull().is_none());
    }

    #[test]
    fn off_round_trip_preserves_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tet.off");
        let mesh = tetrahedron();

        mesh.save_off(&path).unwrap();
        let loaded = Mesh::load_off(&path).unwrap();

        assert_eq!(loaded.vertices(), mesh.vertices());
        assert_eq!(loaded.faces(), mesh.faces());
    }

    #[test]
    fn load_off_reports_missing_file() {
        let err = Mesh::load_off(Path::new("/nonexistent/mesh.off")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
