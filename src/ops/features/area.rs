use super::{AtomFeature, AtomFeatureProvider};
use crate::db;
use crate::model::grid::Grid;
use crate::model::structure::Structure;
use crate::model::types::Point;
use crate::ops::error::Error;
use crate::utils::parallel::map_indexed;
use nalgebra::Vector3;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::f64::consts::PI;

/// Surface measure used for per-atom areas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaMeasure {
    /// Solvent accessible surface area.
    #[default]
    Sasa,
}

/// Near-uniform unit directions on a golden-angle spiral.
fn fibonacci_sphere(samples: usize) -> Vec<Vector3<f64>> {
    let samples = samples.max(1);
    let golden_angle = PI * (3.0 - 5.0_f64.sqrt());

    (0..samples)
        .map(|i| {
            let y = 1.0 - (2.0 * i as f64) / (samples.saturating_sub(1).max(1)) as f64;
            let radius = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i as f64;
            Vector3::new(theta.cos() * radius, y, theta.sin() * radius)
        })
        .collect()
}

fn is_finite(p: &Point) -> bool {
    p.iter().all(|c| c.is_finite())
}

/// Shrake-Rupley solvent accessible area of every atom (`sasa`).
///
/// Each atom is inflated to its van der Waals radius plus `probe_radius` and sampled at
/// `samples` points; a point is exposed unless it falls inside another inflated atom. Atoms
/// with non-finite coordinates neither occlude nor receive area.
#[derive(Debug, Clone)]
pub struct SolventAccessibleArea {
    pub probe_radius: f64,
    pub samples: usize,
}

impl Default for SolventAccessibleArea {
    fn default() -> Self {
        Self {
            probe_radius: 1.4,
            samples: 960,
        }
    }
}

impl SolventAccessibleArea {
    /// Exposed area per atom in square ångströms, in `Structure::iter_atoms` order.
    pub fn atom_areas(&self, structure: &Structure) -> Result<Vec<f64>, Error> {
        if !(self.probe_radius >= 0.0 && self.probe_radius.is_finite()) {
            return Err(Error::invalid_parameter(
                "probe_radius",
                format!("must be a non-negative length, got {}", self.probe_radius),
            ));
        }
        if self.samples == 0 {
            return Err(Error::invalid_parameter("samples", "must be positive"));
        }

        let atoms: Vec<(Point, f64)> = structure
            .iter_atoms()
            .map(|a| (a.pos, a.element.vdw_radius() + self.probe_radius))
            .collect();
        let max_radius = atoms.iter().map(|&(_, r)| r).fold(0.0, f64::max);
        let grid = Grid::new(
            atoms
                .iter()
                .enumerate()
                .filter(|(_, (p, _))| is_finite(p))
                .map(|(i, (p, _))| (*p, i)),
            2.0 * max_radius.max(1.0),
        );
        let sphere = fibonacci_sphere(self.samples);

        Ok(map_indexed(atoms.len(), |i| {
            let (center, radius) = atoms[i];
            if !is_finite(&center) {
                return 0.0;
            }
            let neighbours: Vec<(Point, f64)> = grid
                .within(&center, radius + max_radius)
                .filter(|hit| *hit.item != i)
                .map(|hit| atoms[*hit.item])
                .collect();
            let exposed = sphere
                .iter()
                .filter(|u| {
                    let sample = center + *u * radius;
                    !neighbours
                        .iter()
                        .any(|(p, r)| nalgebra::distance_squared(&sample, p) < r * r)
                })
                .count();
            4.0 * PI * radius * radius * exposed as f64 / sphere.len() as f64
        }))
    }
}

impl AtomFeatureProvider for SolventAccessibleArea {
    fn compute(&self, structure: &Structure) -> Result<Vec<AtomFeature>, Error> {
        Ok(vec![AtomFeature::scalar("sasa", self.atom_areas(structure)?)])
    }
}

/// Spatial aggregation propensity (`sap`).
///
/// Every residue scores its exposed fraction, the summed atom area over the tabulated
/// maximum, times its Kyte-Doolittle hydropathy. An atom sums the scores of all residues
/// with at least one atom within `distance` of it, its own residue included. Residues
/// missing from the table score 0.
#[derive(Debug, Clone)]
pub struct SpatialAggregation {
    pub distance: f64,
    pub area: SolventAccessibleArea,
}

impl Default for SpatialAggregation {
    fn default() -> Self {
        Self {
            distance: 5.0,
            area: SolventAccessibleArea::default(),
        }
    }
}

impl AtomFeatureProvider for SpatialAggregation {
    fn compute(&self, structure: &Structure) -> Result<Vec<AtomFeature>, Error> {
        if !(self.distance >= 0.0 && self.distance.is_finite()) {
            return Err(Error::invalid_parameter(
                "sap",
                format!("distance must be a non-negative length, got {}", self.distance),
            ));
        }
        let areas = self.area.atom_areas(structure)?;

        let mut owner = Vec::with_capacity(areas.len());
        let mut scores = Vec::new();
        let mut offset = 0;
        for residue in structure.iter_chains().flat_map(|c| c.iter_residues()) {
            let count = residue.atom_count();
            let exposed: f64 = areas[offset..offset + count].iter().sum();
            let score = db::residue_properties(&residue.name)
                .filter(|p| p.max_sasa() > 0.0)
                .map(|p| exposed / p.max_sasa() * p.hydrophobicity())
                .unwrap_or(0.0);
            owner.extend(std::iter::repeat_n(scores.len(), count));
            scores.push(score);
            offset += count;
        }

        let positions = structure.positions();
        let grid = Grid::new(
            positions
                .iter()
                .enumerate()
                .filter(|(_, p)| is_finite(p))
                .map(|(i, p)| (*p, i)),
            self.distance.max(1.0),
        );

        let values = map_indexed(positions.len(), |i| {
            if !is_finite(&positions[i]) {
                return 0.0;
            }
            let nearby: BTreeSet<usize> = grid
                .within(&positions[i], self.distance)
                .map(|hit| owner[*hit.item])
                .collect();
            nearby.into_iter().map(|r| scores[r]).sum()
        });

        Ok(vec![AtomFeature::scalar("sap", values)])
    }
}
