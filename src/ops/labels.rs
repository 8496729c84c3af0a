//! Per-vertex class labels derived from proximity to a reference entity.
//!
//! Every vertex takes the class of its nearest reference atom when that atom lies within the
//! distance cutoff, and the default class otherwise. Optional masking marks the band just
//! beyond the cutoff as ambiguous, and optional smoothing replaces each label by the majority
//! over its one-ring.

use crate::classify::{AtomClassifier, ClassId, DEFAULT_CLASS};
use crate::mesh::Mesh;
use crate::model::grid::Grid;
use crate::model::structure::Structure;
use crate::ops::error::Error;
use crate::utils::parallel::map_indexed;

/// Label value of masked vertices.
pub const MASKED: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct LabelConfig {
    /// Vertices farther than this from every reference atom get the default class.
    pub distance_cutoff: f64,
    /// Width of the masked band beyond `distance_cutoff`.
    pub mask_cutoff: f64,
    pub smooth: bool,
    pub mask: bool,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            distance_cutoff: 4.0,
            mask_cutoff: 0.5,
            smooth: false,
            mask: false,
        }
    }
}

impl LabelConfig {
    fn validate(&self) -> Result<(), Error> {
        if !(self.distance_cutoff.is_finite() && self.distance_cutoff >= 0.0) {
            return Err(Error::invalid_parameter(
                "distance_cutoff",
                format!("must be a non-negative number, got {}", self.distance_cutoff),
            ));
        }
        if !(self.mask_cutoff.is_finite() && self.mask_cutoff >= 0.0) {
            return Err(Error::invalid_parameter(
                "mask_cutoff",
                format!("must be a non-negative number, got {}", self.mask_cutoff),
            ));
        }
        Ok(())
    }

    fn search_radius(&self) -> f64 {
        if self.mask {
            self.distance_cutoff + self.mask_cutoff
        } else {
            self.distance_cutoff
        }
    }
}

/// A label vector and the class vocabulary it indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    /// One class id per vertex, or [`MASKED`].
    pub values: Vec<i64>,
    /// Class names; the position of a name is its id.
    pub classes: Vec<String>,
}

impl Labels {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn num_masked(&self) -> usize {
        self.values.iter().filter(|&&v| v == MASKED).count()
    }

    /// Number of vertices per class id.
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.classes.len()];
        for &v in &self.values {
            if let Ok(id) = usize::try_from(v)
                && id < counts.len()
            {
                counts[id] += 1;
            }
        }
        counts
    }
}

/// Labels the vertices of `mesh` by the classes of the nearest atoms of `reference`.
///
/// Equidistant reference atoms resolve to the one that comes first in `reference`. With
/// masking enabled, vertices whose nearest-atom distance lies in
/// `(distance_cutoff, distance_cutoff + mask_cutoff]` get [`MASKED`]; vertices at or inside
/// the cutoff are never masked.
///
/// Smoothing is a single synchronous pass: every unmasked vertex takes the most frequent class
/// among itself and its unmasked adjacent vertices, with ties going to the lower class id.
/// Masked vertices keep their sentinel and do not vote.
pub fn assign_labels(
    reference: &Structure,
    mesh: &Mesh,
    classifier: &AtomClassifier,
    config: &LabelConfig,
) -> Result<Labels, Error> {
    config.validate()?;

    let atoms: Vec<_> = reference
        .iter_atoms_with_context()
        .map(|(_, residue, atom)| (atom.pos, classifier.classify(residue, atom)))
        .collect();
    if atoms.is_empty() {
        log::warn!(
            "reference '{}' has no atoms; every vertex gets the default class",
            reference.name
        );
    }

    let radius = config.search_radius();
    let grid = Grid::new(atoms, radius.max(1.0));

    let mut values = map_indexed(mesh.num_vertices(), |v| {
        match grid.nearest_within(&mesh.vertices()[v], radius) {
            Some(hit) if hit.distance <= config.distance_cutoff => *hit.item as i64,
            Some(_) => MASKED,
            None => DEFAULT_CLASS as i64,
        }
    });

    if config.smooth {
        values = smooth_labels(mesh, &values, classifier.num_classes());
    }

    let labels = Labels {
        values,
        classes: classifier.classes().to_vec(),
    };
    log::debug!(
        "labelled {} vertices against '{}' ({} masked, counts {:?})",
        labels.len(),
        reference.name,
        labels.num_masked(),
        labels.class_counts()
    );
    Ok(labels)
}

/// One majority-vote pass over vertex one-rings.
pub fn smooth_labels(mesh: &Mesh, values: &[i64], num_classes: usize) -> Vec<i64> {
    let adjacency = mesh.adjacency();
    map_indexed(values.len(), |v| {
        if values[v] == MASKED {
            return MASKED;
        }
        let mut votes = vec![0usize; num_classes.max(1)];
        for &u in std::iter::once(&v).chain(&adjacency[v]) {
            if let Ok(id) = usize::try_from(values[u])
                && let Some(count) = votes.get_mut(id)
            {
                *count += 1;
            }
        }
        majority(&votes).map_or(values[v], |id| id as i64)
    })
}

/// Most frequent class; the lowest id wins ties.
fn majority(votes: &[usize]) -> Option<ClassId> {
    let mut best: Option<(ClassId, usize)> = None;
    for (id, &count) in votes.iter().enumerate() {
        if count > 0 && best.is_none_or(|(_, c)| count > c) {
            best = Some((id, count));
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::tests::{strip, tetrahedron};
    use crate::model::{
        atom::Atom,
        chain::Chain,
        residue::Residue,
        types::{Element, Point, ResidueCategory},
    };

    fn ligand(atoms: &[(&str, Point)]) -> Structure {
        let mut residue = Residue::new(1, None, "LIG", None, ResidueCategory::Hetero);
        for (name, pos) in atoms {
            residue.add_atom(Atom::new(name, Element::C, *pos));
        }
        let mut chain = Chain::new("L");
        chain.add_residue(residue);
        let mut structure = Structure::new("ligand");
        structure.add_chain(chain);
        structure
    }

    /// Atoms named `A*` map to class 1, atoms named `B*` to class 2.
    fn two_class() -> AtomClassifier {
        AtomClassifier::from_json_str(
            r#"{
                "name": "TWO",
                "classes": [
                    {"name": "a", "rules": [{"residue": "LIG", "atom": "^A"}]},
                    {"name": "b", "rules": [{"residue": "LIG", "atom": "^B"}]}
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn tetrahedron_vertices_take_the_closer_atom_class() {
        let mesh = tetrahedron();
        let atoms = [("A1", Point::new(-0.5, -0.5, 0.0)), ("B1", Point::new(0.0, 0.0, 1.5))];
        let reference = ligand(&atoms);
        let config = LabelConfig {
            distance_cutoff: 2.0,
            ..LabelConfig::default()
        };

        let labels = assign_labels(&reference, &mesh, &two_class(), &config).unwrap();

        assert_eq!(labels.classes, vec!["none", "a", "b"]);
        for (v, p) in mesh.vertices().iter().enumerate() {
            let da = nalgebra::distance(p, &atoms[0].1);
            let db = nalgebra::distance(p, &atoms[1].1);
            let expected = if da.min(db) > 2.0 {
                0
            } else if da <= db {
                1
            } else {
                2
            };
            assert_eq!(labels.values[v], expected, "vertex {v}");
        }
        assert_eq!(labels.values, vec![1, 1, 1, 2]);
    }

    #[test]
    fn far_vertices_get_the_default_class() {
        let mesh = tetrahedron();
        let reference = ligand(&[("A1", Point::new(20.0, 0.0, 0.0))]);

        let labels = assign_labels(&reference, &mesh, &two_class(), &LabelConfig::default()).unwrap();

        assert_eq!(labels.values, vec![0; 4]);
    }

    #[test]
    fn masking_covers_exactly_the_band_beyond_the_cutoff() {
        let mesh = strip(6);
        let reference = ligand(&[("A1", Point::new(-1.0, 0.0, 0.0))]);
        let config = LabelConfig {
            distance_cutoff: 3.0,
            mask_cutoff: 2.0,
            mask: true,
            smooth: false,
        };

        let labels = assign_labels(&reference, &mesh, &two_class(), &config).unwrap();

        for (v, p) in mesh.vertices().iter().enumerate() {
            let d = nalgebra::distance(p, &Point::new(-1.0, 0.0, 0.0));
            if d <= 3.0 {
                assert_eq!(labels.values[v], 1, "vertex {v} at {d}");
            } else if d <= 5.0 {
                assert_eq!(labels.values[v], MASKED, "vertex {v} at {d}");
            } else {
                assert_eq!(labels.values[v], 0, "vertex {v} at {d}");
            }
        }
        assert!(labels.num_masked() > 0);
    }

    #[test]
    fn zero_width_mask_masks_nothing() {
        let mesh = strip(6);
        let reference = ligand(&[("A1", Point::new(-1.0, 0.0, 0.0))]);
        let config = LabelConfig {
            distance_cutoff: 3.0,
            mask_cutoff: 0.0,
            mask: true,
            smooth: false,
        };

        let labels = assign_labels(&reference, &mesh, &two_class(), &config).unwrap();

        assert_eq!(labels.num_masked(), 0);
    }

    #[test]
    fn equidistant_atoms_resolve_to_the_first() {
        let mesh = tetrahedron();
        // Both atoms are exactly 1 away from vertex 0.
        let reference = ligand(&[("B1", Point::new(0.0, 0.0, -1.0)), ("A1", Point::new(-1.0, 0.0, 0.0))]);
        let config = LabelConfig {
            distance_cutoff: 1.0,
            ..LabelConfig::default()
        };

        let labels = assign_labels(&reference, &mesh, &two_class(), &config).unwrap();

        assert_eq!(labels.values[0], 2);
    }

    #[test]
    fn labelling_is_deterministic() {
        let mesh = strip(10);
        let reference = ligand(&[
            ("A1", Point::new(2.0, 0.5, 1.0)),
            ("B1", Point::new(6.0, 0.5, 1.0)),
            ("A2", Point::new(8.0, 0.5, -1.0)),
        ]);
        let config = LabelConfig {
            mask: true,
            smooth: true,
            ..LabelConfig::default()
        };

        let first = assign_labels(&reference, &mesh, &two_class(), &config).unwrap();
        let second = assign_labels(&reference, &mesh, &two_class(), &config).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn smoothing_leaves_uniform_regions_unchanged() {
        let mesh = strip(4);
        let values = vec![2; mesh.num_vertices()];

        let once = smooth_labels(&mesh, &values, 3);
        let twice = smooth_labels(&mesh, &once, 3);

        assert_eq!(once, values);
        assert_eq!(twice, values);
    }

    #[test]
    fn smoothing_takes_the_majority_and_skips_masked_vertices() {
        let mesh = strip(2);
        // Vertex 0 neighbours 1 and 2.
        let mut values = vec![1; mesh.num_vertices()];
        values[0] = 2;
        values[5] = MASKED;

        let smoothed = smooth_labels(&mesh, &values, 3);

        assert_eq!(smoothed[0], 1);
        assert_eq!(smoothed[5], MASKED);
    }

    #[test]
    fn majority_ties_go_to_the_lower_id() {
        assert_eq!(majority(&[0, 2, 2]), Some(1));
        assert_eq!(majority(&[1, 0, 3]), Some(2));
        assert_eq!(majority(&[0, 0, 0]), None);
    }

    #[test]
    fn smoothing_tie_between_two_classes_picks_lower_id() {
        let mesh = strip(1);
        // Two vertices of class 2, two of class 1: every one-ring is a tie or majority.
        let values = vec![2, 2, 1, 1];

        let smoothed = smooth_labels(&mesh, &values, 3);

        for (v, ring) in mesh.adjacency().iter().enumerate() {
            let mut votes = [0usize; 3];
            votes[values[v] as usize] += 1;
            for &u in ring {
                votes[values[u] as usize] += 1;
            }
            assert_eq!(smoothed[v], majority(&votes).unwrap() as i64);
        }
    }

    #[test]
    fn negative_cutoffs_are_rejected() {
        let mesh = tetrahedron();
        let reference = ligand(&[("A1", Point::origin())]);
        let config = LabelConfig {
            distance_cutoff: -1.0,
            ..LabelConfig::default()
        };

        assert!(assign_labels(&reference, &mesh, &two_class(), &config).is_err());
    }

    #[test]
    fn class_counts_ignore_masked() {
        let labels = Labels {
            values: vec![0, 1, 1, MASKED, 2],
            classes: vec!["none".into(), "a".into(), "b".into()],
        };
        assert_eq!(labels.class_counts(), vec![1, 2, 1]);
        assert_eq!(labels.num_masked(), 1);
    }
}
