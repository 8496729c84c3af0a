use super::area::{AreaMeasure, SolventAccessibleArea, SpatialAggregation};
use super::{AtomFeature, AtomFeatureProvider};
use crate::db;
use crate::model::grid::Grid;
use crate::model::structure::Structure;
use crate::model::types::Point;
use crate::ops::error::Error;
use crate::utils::parallel::map_indexed;
use nalgebra::Vector3;

/// Circular variance of the heavy-atom neighbourhood of every atom.
///
/// For an atom with neighbours `j` within `radius`, the value is `1 - |Σ u_j| / n`, where
/// `u_j` are unit vectors pointing to the neighbours. Buried atoms see neighbours in every
/// direction and score close to 1; protruding atoms score lower. Atoms without neighbours
/// score 0.
#[derive(Debug, Clone)]
pub struct CircularVariance {
    pub radius: f64,
    pub name: String,
}

impl CircularVariance {
    pub fn new(radius: f64, name: impl Into<String>) -> Self {
        Self {
            radius,
            name: name.into(),
        }
    }
}

impl AtomFeatureProvider for CircularVariance {
    fn compute(&self, structure: &Structure) -> Result<Vec<AtomFeature>, Error> {
        if !(self.radius > 0.0) {
            return Err(Error::invalid_parameter(
                &self.name,
                format!("radius must be positive, got {}", self.radius),
            ));
        }

        let atoms: Vec<(Point, bool)> = structure
            .iter_atoms()
            .map(|a| (a.pos, a.is_hydrogen()))
            .collect();
        let heavy = Grid::new(
            atoms
                .iter()
                .enumerate()
                .filter(|(_, (_, is_h))| !is_h)
                .map(|(i, (p, _))| (*p, i)),
            self.radius,
        );

        let values = map_indexed(atoms.len(), |i| {
            let center = atoms[i].0;
            let mut sum = Vector3::zeros();
            let mut count = 0usize;
            for hit in heavy.within(&center, self.radius) {
                if *hit.item == i {
                    continue;
                }
                if let Some(u) = (atoms[*hit.item].0 - center).try_normalize(1e-12) {
                    sum += u;
                    count += 1;
                }
            }
            if count == 0 {
                0.0
            } else {
                1.0 - sum.norm() / count as f64
            }
        });

        Ok(vec![AtomFeature::scalar(&self.name, values)])
    }
}

/// Hydrogen-bond donor and acceptor flags (`hb_donor`, `hb_acceptor`) from the residue table.
#[derive(Debug, Clone, Copy, Default)]
pub struct HydrogenBondAtoms;

impl AtomFeatureProvider for HydrogenBondAtoms {
    fn compute(&self, structure: &Structure) -> Result<Vec<AtomFeature>, Error> {
        let mut donors = Vec::with_capacity(structure.atom_count());
        let mut acceptors = Vec::with_capacity(structure.atom_count());

        for (_, residue, atom) in structure.iter_atoms_with_context() {
            let props = db::residue_properties(&residue.name);
            donors.push(props.is_some_and(|p| p.is_donor(&atom.name)) as u8 as f64);
            acceptors.push(props.is_some_and(|p| p.is_acceptor(&atom.name)) as u8 as f64);
        }

        Ok(vec![
            AtomFeature::scalar("hb_donor", donors),
            AtomFeature::scalar("hb_acceptor", acceptors),
        ])
    }
}

/// Kyte-Doolittle hydropathy of the owning residue (`hydrophobicity`).
#[derive(Debug, Clone, Copy, Default)]
pub struct Hydrophobicity;

impl AtomFeatureProvider for Hydrophobicity {
    fn compute(&self, structure: &Structure) -> Result<Vec<AtomFeature>, Error> {
        let values = structure
            .iter_atoms_with_context()
            .map(|(_, residue, _)| {
                db::residue_properties(&residue.name)
                    .map(|p| p.hydrophobicity())
                    .unwrap_or(0.0)
            })
            .collect();
        Ok(vec![AtomFeature::scalar("hydrophobicity", values)])
    }
}

/// The five Atchley factors of the owning residue, as one 5-wide feature (`atchley`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AtchleyFactors;

impl AtomFeatureProvider for AtchleyFactors {
    fn compute(&self, structure: &Structure) -> Result<Vec<AtomFeature>, Error> {
        let mut values = Vec::with_capacity(structure.atom_count() * 5);
        for (_, residue, _) in structure.iter_atoms_with_context() {
            let factors = db::residue_properties(&residue.name)
                .map(|p| p.atchley_factors())
                .unwrap_or([0.0; 5]);
            values.extend_from_slice(&factors);
        }
        Ok(vec![AtomFeature::vector("atchley", 5, values)])
    }
}

/// The standard provider set: surface area and aggregation propensity under `measure`,
/// circular variance at three scales, hydrogen-bond flags, hydropathy, and Atchley factors.
pub fn default_providers(measure: AreaMeasure) -> Vec<Box<dyn AtomFeatureProvider>> {
    let mut providers: Vec<Box<dyn AtomFeatureProvider>> = match measure {
        AreaMeasure::Sasa => vec![
            Box::new(SolventAccessibleArea::default()),
            Box::new(SpatialAggregation::default()),
        ],
    };
    providers.extend([
        Box::new(CircularVariance::new(10.0, "cv_fine")) as Box<dyn AtomFeatureProvider>,
        Box::new(CircularVariance::new(25.0, "cv_medium")),
        Box::new(CircularVariance::new(100.0, "cv_coarse")),
        Box::new(HydrogenBondAtoms),
        Box::new(Hydrophobicity),
        Box::new(AtchleyFactors),
    ]);
    providers
}

/// Feature names produced by [`default_providers`], in mapping order.
pub fn default_feature_names() -> Vec<String> {
    [
        "sasa",
        "sap",
        "cv_fine",
        "cv_medium",
        "cv_coarse",
        "hb_donor",
        "hb_acceptor",
        "hydrophobicity",
        "atchley",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
