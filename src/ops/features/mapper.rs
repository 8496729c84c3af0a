use super::{AtomFeature, AtomFeatureTable, FeatureMatrix};
use crate::mesh::Mesh;
use crate::model::grid::Grid;
use crate::model::structure::Structure;
use crate::ops::error::Error;
use crate::utils::parallel::map_indexed;
use ndarray::Array2;

/// Lower bound on atom-vertex distances used in inverse-distance weights.
const MIN_DISTANCE: f64 = 1e-5;

/// Parameters for [`map_atom_features_to_mesh`].
#[derive(Debug, Clone)]
pub struct MapperConfig {
    /// Neighbourhood radius around each vertex, in ångströms.
    pub radius: f64,
    /// Whether hydrogen atoms contribute to the average.
    pub include_hydrogens: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            radius: 3.0,
            include_hydrogens: false,
        }
    }
}

/// Interpolates atom-level features onto the vertices of `mesh`.
///
/// Each vertex receives the inverse-distance weighted average of the atoms within
/// `config.radius`, with weights `1 / max(d, 1e-5)` normalised to sum to one and accumulated in
/// atom order. A vertex with no atom in range takes the values of its nearest atom. Atoms with
/// non-finite coordinates are ignored.
///
/// Columns follow `feature_names` order; a feature of width `w` expands into `w` consecutive
/// columns named by [`AtomFeature::column_names`].
///
/// # Errors
///
/// Returns [`Error::UnknownFeature`] when a name is not in `table`,
/// [`Error::FeatureSizeMismatch`] when the table does not describe `structure`, and
/// [`Error::NoAtoms`] when the structure has no usable atoms.
pub fn map_atom_features_to_mesh(
    mesh: &Mesh,
    structure: &Structure,
    table: &AtomFeatureTable,
    feature_names: &[String],
    config: &MapperConfig,
) -> Result<FeatureMatrix, Error> {
    if !(config.radius > 0.0) {
        return Err(Error::invalid_parameter(
            "radius",
            format!("must be positive, got {}", config.radius),
        ));
    }
    if table.num_atoms() != structure.atom_count() {
        return Err(Error::FeatureSizeMismatch {
            name: "<table>".to_string(),
            expected: structure.atom_count(),
            found: table.num_atoms(),
            num_atoms: structure.atom_count(),
            width: 1,
        });
    }

    let selected: Vec<&AtomFeature> = feature_names
        .iter()
        .map(|name| {
            table
                .get(name)
                .ok_or_else(|| Error::unknown_feature(name, table.names()))
        })
        .collect::<Result<_, _>>()?;
    let columns: Vec<String> = selected.iter().flat_map(|f| f.column_names()).collect();
    let width = columns.len();

    let grid = Grid::new(
        structure
            .iter_atoms()
            .enumerate()
            .filter(|(_, atom)| config.include_hydrogens || !atom.is_hydrogen())
            .filter(|(_, atom)| atom.pos.iter().all(|c| c.is_finite()))
            .map(|(i, atom)| (atom.pos, i)),
        config.radius,
    );
    if grid.is_empty() {
        return Err(Error::no_atoms(&structure.name, "feature mapping"));
    }

    let rows = map_indexed(mesh.num_vertices(), |v| {
        let vertex = &mesh.vertices()[v];
        let mut hits: Vec<(usize, f64)> = grid
            .within(vertex, config.radius)
            .map(|hit| (hit.slot, hit.distance))
            .collect();
        if hits.is_empty() {
            hits.extend(grid.nearest(vertex).map(|hit| (hit.slot, 0.0)));
        }
        hits.sort_unstable_by_key(|&(slot, _)| slot);

        let weights: Vec<f64> = hits.iter().map(|&(_, d)| 1.0 / d.max(MIN_DISTANCE)).collect();
        let total: f64 = weights.iter().sum();

        let mut row = vec![0.0; width];
        for (&(slot, _), w) in hits.iter().zip(&weights) {
            let Some(&atom) = grid.get(slot) else {
                continue;
            };
            let w = w / total;
            let mut col = 0;
            for feature in &selected {
                for value in feature.row(atom) {
                    row[col] += w * value;
                    col += 1;
                }
            }
        }
        row
    });

    let mut values = Array2::zeros((mesh.num_vertices(), width));
    for (v, row) in rows.into_iter().enumerate() {
        for (c, value) in row.into_iter().enumerate() {
            values[[v, c]] = value;
        }
    }

    log::debug!(
        "mapped {} feature columns onto {} vertices of '{}'",
        width,
        mesh.num_vertices(),
        structure.name
    );
    FeatureMatrix::new(columns, values)
}
