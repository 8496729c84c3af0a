//! Per-structure array bundles.
//!
//! A bundle is an NPZ archive keyed by array name. Arrays are grouped logically:
//!
//! | Group | Arrays |
//! | --- | --- |
//! | geometry | `V` f64 (n, 3), `F` i64 (m, 3), `N` f64 (n, 3) |
//! | features | `X` f64 (n, k), `feature_names` (k names) |
//! | labels | `Y_<classifier>` i64 (n,), `Y_<classifier>_classes` |
//! | identity | `name` |
//!
//! Updating one group leaves every other array untouched, including arrays written by other
//! tools. The vertex adjacency lives in a sibling artifact (see [`save_adjacency`]).

mod adjacency;
mod archive;
mod error;
mod plan;

pub use adjacency::{load_adjacency, save_adjacency};
pub use archive::{BundleArray, read_archive, write_archive};
pub use error::Error;
pub use plan::{BundleState, Group, RefreshPlan, Request};

use crate::mesh::Mesh;
use crate::model::types::Point;
use crate::ops::{FeatureMatrix, Labels};
use ndarray::{Array1, Array2, ArrayD, Ix2};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

pub const VERTICES: &str = "V";
pub const FACES: &str = "F";
pub const NORMALS: &str = "N";
pub const FEATURES: &str = "X";
pub const FEATURE_NAMES: &str = "feature_names";
pub const NAME: &str = "name";

const LABEL_PREFIX: &str = "Y_";
const CLASSES_SUFFIX: &str = "_classes";

/// Key of the label vector produced by classifier `name`.
pub fn label_key(name: &str) -> String {
    format!("{LABEL_PREFIX}{name}")
}

/// Key of the class vocabulary produced by classifier `name`.
pub fn classes_key(name: &str) -> String {
    format!("{LABEL_PREFIX}{name}{CLASSES_SUFFIX}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    name: String,
    arrays: BTreeMap<String, BundleArray>,
}

impl Bundle {
    /// Creates an empty bundle for the structure `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut arrays = BTreeMap::new();
        arrays.insert(NAME.to_string(), BundleArray::text(name.clone()));
        Self { name, arrays }
    }

    /// Reads a bundle from disk. The bundle name comes from its `name` entry, or from the
    /// file stem when that entry is absent.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let arrays = read_archive(path)?;
        let name = arrays
            .get(NAME)
            .and_then(BundleArray::as_text)
            .map(str::to_string)
            .unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default()
            });
        Ok(Self { name, arrays })
    }

    /// Loads the bundle at `path` if it exists, otherwise starts an empty one.
    pub fn load_or_new(path: &Path, name: &str) -> Result<Self, Error> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new(name))
        }
    }

    /// Validates and writes the bundle atomically.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        self.validate()?;
        write_archive(path, &self.arrays)?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.arrays.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&BundleArray> {
        self.arrays.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.arrays.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, array: BundleArray) -> Option<BundleArray> {
        self.arrays.insert(key.into(), array)
    }

    pub fn remove(&mut self, key: &str) -> Option<BundleArray> {
        self.arrays.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BundleArray)> {
        self.arrays.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of vertices according to `V`.
    pub fn num_vertices(&self) -> Option<usize> {
        self.arrays.get(VERTICES).and_then(BundleArray::rows)
    }

    /// Classifier names with a label vector in this bundle.
    pub fn label_names(&self) -> BTreeSet<String> {
        self.arrays
            .keys()
            .filter_map(|k| k.strip_prefix(LABEL_PREFIX))
            .filter(|k| !k.ends_with(CLASSES_SUFFIX))
            .map(str::to_string)
            .collect()
    }

    /// Group membership, combined with whether the adjacency artifact exists.
    pub fn state(&self, adjacency: bool) -> BundleState {
        BundleState {
            geometry: self.contains(VERTICES) && self.contains(FACES),
            features: self
                .contains(FEATURES)
                .then(|| self.arrays.get(FEATURE_NAMES).and_then(BundleArray::as_text_list))
                .flatten(),
            labels: self.label_names(),
            adjacency,
        }
    }

    /// Stores `V`, `F`, and `N` from `mesh`.
    ///
    /// Returns whether `V` or `F` differ from what the bundle held before. Vertex-indexed
    /// arrays computed on an earlier surface are not touched here; see
    /// [`Bundle::remove_surface_data`].
    pub fn set_geometry(&mut self, mesh: &Mesh) -> bool {
        let vertices = BundleArray::F64(points_to_array(mesh.vertices()).into_dyn());
        let faces = BundleArray::I64(faces_to_array(mesh.faces()).into_dyn());
        let changed = self.arrays.get(VERTICES) != Some(&vertices) || self.arrays.get(FACES) != Some(&faces);

        self.arrays.insert(VERTICES.to_string(), vertices);
        self.arrays.insert(FACES.to_string(), faces);
        let normals: Vec<Point> = mesh.vertex_normals().iter().map(|n| Point::from(*n)).collect();
        self.arrays.insert(NORMALS.to_string(), BundleArray::F64(points_to_array(&normals).into_dyn()));
        changed
    }

    /// Rebuilds the mesh stored in `V` and `F`, if present.
    pub fn mesh(&self) -> Result<Option<Mesh>, Error> {
        let (Some(v), Some(f)) = (self.arrays.get(VERTICES), self.arrays.get(FACES)) else {
            return Ok(None);
        };
        let vertices = self.float_matrix(VERTICES, v, Some(3))?;
        let faces = self.int_matrix(FACES, f, 3)?;

        let vertices: Vec<Point> = vertices
            .rows()
            .into_iter()
            .map(|r| Point::new(r[0], r[1], r[2]))
            .collect();
        let mut tris = Vec::with_capacity(faces.nrows());
        for r in faces.rows() {
            let mut tri = [0usize; 3];
            for (slot, &index) in tri.iter_mut().zip(r.iter()) {
                *slot = usize::try_from(index).map_err(|_| {
                    Error::shape_mismatch(&self.name, FACES, "non-negative vertex indices", &[faces.nrows(), 3])
                })?;
            }
            tris.push(tri);
        }

        let num_vertices = vertices.len();
        let mesh = Mesh::new(vertices, tris)?;
        if mesh.num_vertices() != num_vertices {
            return Err(Error::shape_mismatch(
                &self.name,
                VERTICES,
                format!("a single connected surface of {} vertices", num_vertices),
                &[mesh.num_vertices(), 3],
            ));
        }
        Ok(Some(mesh))
    }

    /// Stores `X` and `feature_names`.
    pub fn set_features(&mut self, features: &FeatureMatrix) -> Result<(), Error> {
        self.check_rows(FEATURES, features.num_rows(), &[features.num_rows(), features.num_columns()])?;
        self.arrays.insert(
            FEATURES.to_string(),
            BundleArray::F64(features.values().clone().into_dyn()),
        );
        self.arrays.insert(
            FEATURE_NAMES.to_string(),
            BundleArray::text_list(features.names()),
        );
        Ok(())
    }

    /// Reads `X` and `feature_names`, if present.
    pub fn features(&self) -> Result<Option<FeatureMatrix>, Error> {
        let Some(x) = self.arrays.get(FEATURES) else {
            return Ok(None);
        };
        let values = self.float_matrix(FEATURES, x, None)?;
        let names = self
            .arrays
            .get(FEATURE_NAMES)
            .and_then(BundleArray::as_text_list)
            .ok_or_else(|| Error::missing_array(&self.name, FEATURE_NAMES))?;
        if names.len() != values.ncols() {
            return Err(Error::shape_mismatch(
                &self.name,
                FEATURE_NAMES,
                format!("{} names", values.ncols()),
                &[names.len()],
            ));
        }
        FeatureMatrix::new(names, values)
            .map(Some)
            .map_err(|e| Error::shape_mismatch(&self.name, FEATURE_NAMES, e.to_string(), &[]))
    }

    /// Stores `Y_<classifier>` and `Y_<classifier>_classes`, leaving other label sets alone.
    pub fn set_labels(&mut self, classifier: &str, labels: &Labels) -> Result<(), Error> {
        let key = label_key(classifier);
        self.check_rows(&key, labels.len(), &[labels.len()])?;
        self.arrays.insert(
            key,
            BundleArray::I64(Array1::from(labels.values.clone()).into_dyn()),
        );
        self.arrays.insert(
            classes_key(classifier),
            BundleArray::text_list(&labels.classes),
        );
        Ok(())
    }

    /// Reads the labels produced by `classifier`, if present.
    pub fn labels(&self, classifier: &str) -> Result<Option<Labels>, Error> {
        let key = label_key(classifier);
        let Some(y) = self.arrays.get(&key) else {
            return Ok(None);
        };
        let values = match y {
            BundleArray::I64(a) if a.ndim() == 1 => a.iter().copied().collect(),
            BundleArray::I32(a) if a.ndim() == 1 => a.iter().map(|&v| v as i64).collect(),
            other => {
                return Err(Error::TypeMismatch {
                    bundle: self.name.clone(),
                    name: key,
                    expected: "one-dimensional i64",
                    found: other.dtype(),
                });
            }
        };
        let classes = self
            .arrays
            .get(&classes_key(classifier))
            .and_then(BundleArray::as_text_list)
            .ok_or_else(|| Error::missing_array(&self.name, classes_key(classifier)))?;
        Ok(Some(Labels { values, classes }))
    }

    /// Removes the features and every label set, which describe a surface that has been
    /// replaced. Arrays written by other tools are kept.
    ///
    /// Returns the keys of the removed data arrays.
    pub fn remove_surface_data(&mut self) -> Vec<String> {
        let mut removed = Vec::new();
        if self.arrays.remove(FEATURES).is_some() {
            removed.push(FEATURES.to_string());
        }
        self.arrays.remove(FEATURE_NAMES);
        for name in self.label_names() {
            let key = label_key(&name);
            self.arrays.remove(&key);
            self.arrays.remove(&classes_key(&name));
            removed.push(key);
        }
        removed
    }

    /// Checks that every vertex-indexed array agrees with `V` and that feature names match
    /// the feature columns.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(v) = self.arrays.get(VERTICES) {
            let shape = v.shape();
            if shape.len() != 2 || shape[1] != 3 {
                return Err(Error::shape_mismatch(&self.name, VERTICES, "(n, 3)", &shape));
            }
        }
        if let Some(f) = self.arrays.get(FACES) {
            let shape = f.shape();
            if shape.len() != 2 || shape[1] != 3 {
                return Err(Error::shape_mismatch(&self.name, FACES, "(m, 3)", &shape));
            }
        }

        for key in self.vertex_indexed_keys() {
            if let Some(array) = self.arrays.get(&key) {
                let shape = array.shape();
                self.check_rows(&key, shape.first().copied().unwrap_or(0), &shape)?;
            }
        }

        if let Some(x) = self.arrays.get(FEATURES) {
            let shape = x.shape();
            let names = self
                .arrays
                .get(FEATURE_NAMES)
                .and_then(BundleArray::as_text_list)
                .ok_or_else(|| Error::missing_array(&self.name, FEATURE_NAMES))?;
            if shape.len() != 2 || shape[1] != names.len() {
                return Err(Error::shape_mismatch(
                    &self.name,
                    FEATURES,
                    format!("(n, {})", names.len()),
                    &shape,
                ));
            }
        }
        Ok(())
    }

    fn vertex_indexed_keys(&self) -> Vec<String> {
        let mut keys = vec![NORMALS.to_string(), FEATURES.to_string()];
        keys.extend(self.label_names().iter().map(|n| label_key(n)));
        keys
    }

    fn check_rows(&self, key: &str, rows: usize, shape: &[usize]) -> Result<(), Error> {
        match self.num_vertices() {
            Some(n) if n != rows => Err(Error::shape_mismatch(
                &self.name,
                key,
                format!("{} rows to match {}", n, VERTICES),
                shape,
            )),
            _ => Ok(()),
        }
    }

    fn float_matrix(
        &self,
        key: &str,
        array: &BundleArray,
        cols: Option<usize>,
    ) -> Result<Array2<f64>, Error> {
        let matrix = match array {
            BundleArray::F64(a) => into_matrix(a.clone()),
            BundleArray::F32(a) => into_matrix(a.mapv(f64::from)),
            other => {
                return Err(Error::TypeMismatch {
                    bundle: self.name.clone(),
                    name: key.to_string(),
                    expected: "f64",
                    found: other.dtype(),
                });
            }
        };
        match matrix {
            Some(m) if cols.is_none_or(|c| m.ncols() == c) => Ok(m),
            _ => Err(Error::shape_mismatch(
                &self.name,
                key,
                cols.map_or("a matrix".to_string(), |c| format!("(n, {c})")),
                &array.shape(),
            )),
        }
    }

    fn int_matrix(&self, key: &str, array: &BundleArray, cols: usize) -> Result<Array2<i64>, Error> {
        let matrix = match array {
            BundleArray::I64(a) => into_matrix(a.clone()),
            BundleArray::I32(a) => into_matrix(a.mapv(i64::from)),
            other => {
                return Err(Error::TypeMismatch {
                    bundle: self.name.clone(),
                    name: key.to_string(),
                    expected: "i64",
                    found: other.dtype(),
                });
            }
        };
        match matrix {
            Some(m) if m.ncols() == cols => Ok(m),
            _ => Err(Error::shape_mismatch(&self.name, key, format!("(m, {cols})"), &array.shape())),
        }
    }
}

fn into_matrix<T>(array: ArrayD<T>) -> Option<Array2<T>> {
    array.into_dimensionality::<Ix2>().ok()
}

fn points_to_array(points: &[Point]) -> Array2<f64> {
    Array2::from_shape_fn((points.len(), 3), |(i, j)| points[i][j])
}

fn faces_to_array(faces: &[[usize; 3]]) -> Array2<i64> {
    Array2::from_shape_fn((faces.len(), 3), |(i, j)| faces[i][j] as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::{strip, tetrahedron};
    use ndarray::array;

    fn features(rows: usize) -> FeatureMatrix {
        let values = Array2::from_shape_fn((rows, 2), |(i, j)| 0.1 * i as f64 + j as f64 / 3.0);
        FeatureMatrix::new(vec!["cv_fine".into(), "pot".into()], values).unwrap()
    }

    fn labels(values: Vec<i64>) -> Labels {
        Labels {
            values,
            classes: vec!["none".into(), "dna".into()],
        }
    }

    fn bits(array: &BundleArray) -> Vec<u64> {
        match array {
            BundleArray::F64(a) => a.iter().map(|v| v.to_bits()).collect(),
            other => panic!("expected f64, found {}", other.dtype()),
        }
    }

    #[test]
    fn geometry_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1abc_protein_data.npz");
        let mesh = tetrahedron();

        let mut bundle = Bundle::new("1abc_protein");
        bundle.set_geometry(&mesh);
        bundle.save(&path).unwrap();

        let loaded = Bundle::load(&path).unwrap();
        assert_eq!(loaded.name(), "1abc_protein");
        assert_eq!(loaded.num_vertices(), Some(4));
        let restored = loaded.mesh().unwrap().unwrap();
        assert_eq!(restored.vertices(), mesh.vertices());
        assert_eq!(restored.faces(), mesh.faces());
        assert_eq!(loaded.get(NORMALS).unwrap().shape(), vec![4, 3]);
    }

    #[test]
    fn label_update_preserves_features_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.npz");
        let mesh = strip(3);

        let mut bundle = Bundle::new("s");
        bundle.set_geometry(&mesh);
        bundle.set_features(&features(mesh.num_vertices())).unwrap();
        bundle.save(&path).unwrap();
        let before = Bundle::load(&path).unwrap();

        let mut update = Bundle::load(&path).unwrap();
        update.set_labels("DNA", &labels(vec![1; mesh.num_vertices()])).unwrap();
        update.save(&path).unwrap();
        let after = Bundle::load(&path).unwrap();

        assert_eq!(bits(after.get(FEATURES).unwrap()), bits(before.get(FEATURES).unwrap()));
        assert_eq!(after.get(FEATURE_NAMES), before.get(FEATURE_NAMES));
        assert_eq!(after.features().unwrap(), before.features().unwrap());
        assert_eq!(after.labels("DNA").unwrap().unwrap().values, vec![1; mesh.num_vertices()]);
    }

    #[test]
    fn labels_from_another_classifier_are_kept() {
        let mesh = tetrahedron();
        let mut bundle = Bundle::new("s");
        bundle.set_geometry(&mesh);
        bundle.set_labels("DNA", &labels(vec![0, 1, 1, 0])).unwrap();
        bundle.set_labels("RNA", &labels(vec![1, 1, 0, -1])).unwrap();

        assert_eq!(
            bundle.label_names(),
            BTreeSet::from(["DNA".to_string(), "RNA".to_string()])
        );
        assert_eq!(bundle.labels("DNA").unwrap().unwrap().values, vec![0, 1, 1, 0]);
        assert!(bundle.contains("Y_RNA_classes"));
    }

    #[test]
    fn unchanged_bundle_rewrites_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.npz");
        let mesh = tetrahedron();

        let mut bundle = Bundle::new("s");
        bundle.set_geometry(&mesh);
        bundle.set_features(&features(4)).unwrap();
        bundle.set_labels("DNA", &labels(vec![0, 1, 1, 0])).unwrap();
        bundle.insert("extra", BundleArray::F32(array![[1.5f32, 2.5]].into_dyn()));
        bundle.save(&path).unwrap();

        let loaded = Bundle::load(&path).unwrap();
        let request = Request {
            features: true,
            electrostatics: false,
            labels: Some("DNA".into()),
            adjacency: false,
            refresh: false,
        };
        assert!(RefreshPlan::new(&request, &loaded.state(false)).is_noop());

        loaded.save(&path).unwrap();
        let reloaded = Bundle::load(&path).unwrap();
        assert_eq!(reloaded, bundle);
    }

    #[test]
    fn mismatched_label_length_is_rejected() {
        let mut bundle = Bundle::new("s");
        bundle.set_geometry(&tetrahedron());

        let err = bundle.set_labels("DNA", &labels(vec![0, 1])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { ref name, .. } if name == "Y_DNA"));
        assert!(!bundle.contains("Y_DNA"));
    }

    #[test]
    fn stale_vertex_arrays_block_the_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.npz");

        let mut bundle = Bundle::new("s");
        bundle.set_geometry(&tetrahedron());
        bundle.set_features(&features(4)).unwrap();
        bundle.save(&path).unwrap();

        let mut update = Bundle::load(&path).unwrap();
        update.set_geometry(&strip(2));
        let err = update.save(&path).unwrap_err();

        assert!(matches!(err, Error::ShapeMismatch { ref name, .. } if name == FEATURES));
        assert_eq!(Bundle::load(&path).unwrap(), bundle);
    }

    #[test]
    fn set_geometry_reports_whether_the_surface_changed() {
        let mut bundle = Bundle::new("s");

        assert!(bundle.set_geometry(&tetrahedron()));
        assert!(!bundle.set_geometry(&tetrahedron()));

        // Same vertex count, different positions.
        let moved: Vec<Point> = tetrahedron().vertices().iter().map(|p| p * 2.0).collect();
        let moved = Mesh::new(moved, tetrahedron().faces().to_vec()).unwrap();
        assert!(bundle.set_geometry(&moved));
        assert!(bundle.set_geometry(&strip(3)));
    }

    #[test]
    fn remove_surface_data_drops_features_and_labels_only() {
        let mut bundle = Bundle::new("s");
        bundle.set_geometry(&tetrahedron());
        bundle.set_features(&features(4)).unwrap();
        bundle.set_labels("DNA", &labels(vec![0; 4])).unwrap();
        bundle.set_labels("RNA", &labels(vec![1; 4])).unwrap();
        bundle.insert("extra", BundleArray::F32(array![[1.5f32, 2.5]].into_dyn()));

        let removed = bundle.remove_surface_data();

        assert_eq!(
            removed,
            vec![FEATURES.to_string(), "Y_DNA".to_string(), "Y_RNA".to_string()]
        );
        assert!(!bundle.contains(FEATURE_NAMES) && !bundle.contains("Y_DNA_classes"));
        assert!(bundle.contains("extra") && bundle.contains(VERTICES));
        assert!(bundle.remove_surface_data().is_empty());
        bundle.validate().unwrap();
    }

    #[test]
    fn state_reports_groups() {
        let mut bundle = Bundle::new("s");
        assert_eq!(bundle.state(false), BundleState::default());

        bundle.set_geometry(&tetrahedron());
        bundle.set_features(&features(4)).unwrap();
        bundle.set_labels("DNA", &labels(vec![0; 4])).unwrap();

        let state = bundle.state(true);
        assert!(state.geometry && state.adjacency);
        assert_eq!(state.features, Some(vec!["cv_fine".to_string(), "pot".to_string()]));
        assert_eq!(state.labels, BTreeSet::from(["DNA".to_string()]));
    }

    #[test]
    fn load_or_new_starts_empty_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = Bundle::load_or_new(&dir.path().join("none.npz"), "x").unwrap();

        assert_eq!(bundle.name(), "x");
        assert_eq!(bundle.names().collect::<Vec<_>>(), vec![NAME]);
    }

    #[test]
    fn label_keys() {
        assert_eq!(label_key("DNA"), "Y_DNA");
        assert_eq!(classes_key("DNA"), "Y_DNA_classes");
    }
}
