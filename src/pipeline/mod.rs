//! Batch orchestration: one bundle per structure in a list file.
//!
//! For each structure the pipeline reads the complex, splits off and cleans the protein
//! receptor, and brings the bundle `<FEATURE_DATA_PATH>/<id>_data.npz` up to date with the
//! requested groups. Only missing groups are computed unless a refresh is forced. Errors are
//! reported per structure and the run moves on; configuration errors abort it.

mod config;
mod error;
mod manifest;

pub use config::Config;
pub use error::Error;
pub use manifest::{Manifest, read_structure_list};

use crate::bundle::{Bundle, FEATURES, Group, RefreshPlan, Request, label_key, save_adjacency};
use crate::classify::AtomClassifier;
use crate::external::{
    ApbsSolver, CommandMeshGenerator, ElectrostaticsSolver, MeshGenerator, MeshParameters,
    Potentials, Scratch, discard_cached_potentials, load_cached_potentials,
};
use crate::io::{self, IoContext};
use crate::mesh::Mesh;
use crate::model::structure::Structure;
use crate::ops::{
    AtomFeatureProvider, AtomFeatureTable, CleanConfig, DEFAULT_PROBE_OFFSET, LabelConfig,
    MapperConfig, assign_labels, clean_structure, default_feature_names, default_providers,
    geometry_features, map_atom_features_to_mesh, map_electrostatics_to_mesh, select_residues,
    split_entities,
};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Which groups a run maintains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub features: bool,
    /// Append `pot` and `acc` columns to the features.
    pub electrostatics: bool,
    pub labels: bool,
    pub adjacency: bool,
    /// Recompute every requested group, ignoring bundles and cached meshes or grids.
    pub refresh: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            features: true,
            electrostatics: true,
            labels: true,
            adjacency: true,
            refresh: false,
        }
    }
}

/// Result of processing one structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub id: String,
    /// Bundle file name relative to `FEATURE_DATA_PATH`.
    pub bundle_file: String,
    /// Groups recomputed for this structure; empty when the bundle was already complete.
    pub updated: Vec<Group>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    /// Identifiers of the structures that failed.
    pub failed: Vec<String>,
}

/// Identifier of the receptor of a structure file: the file name without its extension,
/// followed by `_protein`.
pub fn structure_id(entry: &str) -> String {
    format!("{}_protein", file_stem(entry))
}

fn file_stem(entry: &str) -> String {
    Path::new(entry)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub struct Pipeline {
    config: Config,
    options: Options,
    classifier: Option<AtomClassifier>,
    providers: Vec<Box<dyn AtomFeatureProvider>>,
    feature_names: Vec<String>,
    mesh_generator: Option<Box<dyn MeshGenerator>>,
    solver: Box<dyn ElectrostaticsSolver>,
    context: IoContext,
}

impl Pipeline {
    /// Checks the configuration against the options and prepares the output directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when labels are requested without a classifier, when
    /// electrostatics are requested without `ELECTROSTATICS_PATH`, or when an output
    /// directory cannot be created.
    pub fn new(
        config: Config,
        options: Options,
        classifier: Option<AtomClassifier>,
    ) -> Result<Self, Error> {
        if options.labels && classifier.is_none() {
            return Err(Error::config(None, "labels were requested but no classifier was given"));
        }
        let mut outputs = vec![config.feature_data_path.as_path(), config.mesh_files_path.as_path()];
        if options.features && options.electrostatics {
            outputs.push(config.electrostatics_dir()?);
        }
        for dir in outputs {
            fs::create_dir_all(dir).map_err(|e| {
                Error::config(None, format!("cannot create directory '{}': {}", dir.display(), e))
            })?;
        }

        let defaults = ApbsSolver::default();
        let solver = ApbsSolver {
            pdb2pqr: config.pdb2pqr.clone().unwrap_or(defaults.pdb2pqr),
            apbs: config.apbs.clone().unwrap_or(defaults.apbs),
            force_field: config.force_field.clone(),
            ..defaults
        };
        let mesh_generator = config
            .mesh_generator
            .clone()
            .map(|command| Box::new(CommandMeshGenerator::new(command)) as Box<dyn MeshGenerator>);

        Ok(Self {
            providers: default_providers(config.area_measure),
            config,
            options,
            classifier,
            feature_names: default_feature_names(),
            mesh_generator,
            solver: Box::new(solver),
            context: IoContext::new_default(),
        })
    }

    pub fn with_mesh_generator(mut self, generator: Box<dyn MeshGenerator>) -> Self {
        self.mesh_generator = Some(generator);
        self
    }

    pub fn with_solver(mut self, solver: Box<dyn ElectrostaticsSolver>) -> Self {
        self.solver = solver;
        self
    }

    /// Replaces the atom feature providers and the feature columns mapped onto the mesh.
    pub fn with_providers(
        mut self,
        providers: Vec<Box<dyn AtomFeatureProvider>>,
        feature_names: Vec<String>,
    ) -> Self {
        self.providers = providers;
        self.feature_names = feature_names;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Processes every entry in order, recording each completed bundle in `manifest`.
    ///
    /// `on_entry` is called after each entry, whatever its outcome.
    pub fn run<F>(&self, entries: &[String], manifest: &mut Manifest, mut on_entry: F) -> Result<RunSummary, Error>
    where
        F: FnMut(&str),
    {
        let mut summary = RunSummary::default();
        for entry in entries {
            match self.process(entry) {
                Ok(outcome) => {
                    manifest.record(&outcome.bundle_file)?;
                    summary.processed += 1;
                }
                Err(e) if e.is_fatal_for_run() => {
                    log::error!("aborting run at '{}': {}", structure_id(entry), e);
                    return Err(e);
                }
                Err(e) => {
                    let id = structure_id(entry);
                    log::error!("failed to process '{}': {}", id, e);
                    summary.failed.push(id);
                }
            }
            on_entry(entry);
        }
        Ok(summary)
    }

    /// Brings the bundle of one structure up to date.
    pub fn process(&self, entry: &str) -> Result<Outcome, Error> {
        let id = structure_id(entry);
        let bundle_file = format!("{}_data.npz", id);
        let bundle_path = self.config.feature_data_path.join(&bundle_file);
        let adjacency_path = self.config.feature_data_path.join(format!("{}_adj.npz", id));

        let mut bundle = Bundle::load_or_new(&bundle_path, &id)?;
        let request = Request {
            features: self.options.features,
            electrostatics: self.options.features && self.options.electrostatics,
            labels: self
                .classifier
                .as_ref()
                .filter(|_| self.options.labels)
                .map(|c| c.name().to_string()),
            adjacency: self.options.adjacency,
            refresh: self.options.refresh,
        };
        let plan = RefreshPlan::new(&request, &bundle.state(adjacency_path.exists()));

        if plan.is_noop() {
            log::info!("'{}' is up to date", id);
            bundle.save(&bundle_path)?;
            return Ok(Outcome {
                id,
                bundle_file,
                updated: Vec::new(),
            });
        }
        let updated = plan.groups();
        log::info!(
            "processing '{}': {}",
            id,
            updated.iter().map(Group::to_string).collect::<Vec<_>>().join(", ")
        );

        let complex = self.read_structure(entry)?;
        let entities = split_entities(&complex);
        let mut protein = entities.protein;
        clean_structure(&mut protein, &CleanConfig::receptor(self.config.hydrogens))?;
        log::debug!("'{}': receptor has {} atoms", id, protein.atom_count());

        let scratch = Scratch::new(&id)?;
        let mesh = self.obtain_mesh(&id, &protein, &bundle, &plan, &scratch)?;

        if plan.geometry && bundle.set_geometry(&mesh) {
            let recomputed = |key: &str| {
                (plan.features && key == FEATURES) || plan.labels.as_deref().is_some_and(|name| key == label_key(name))
            };
            for key in bundle.remove_surface_data() {
                if !recomputed(&key) {
                    log::warn!("'{}': dropped '{}' computed on the previous surface", id, key);
                }
            }
        }

        if plan.features {
            let table = AtomFeatureTable::compute(&protein, &self.providers)?;
            let mapper = MapperConfig {
                radius: self.config.feature_radius,
                include_hydrogens: self.config.hydrogens,
            };
            let mapped = map_atom_features_to_mesh(&mesh, &protein, &table, &self.feature_names, &mapper)?;
            let mut features = geometry_features(&mesh)?.hstack(mapped)?;
            if request.electrostatics {
                let potentials = self.potentials(&id, &protein, &scratch)?;
                let sampled = map_electrostatics_to_mesh(
                    &mesh,
                    &potentials.potential,
                    &potentials.accessibility,
                    DEFAULT_PROBE_OFFSET,
                )?;
                features = features.hstack(sampled)?;
            }
            bundle.set_features(&features)?;
        }

        if let Some(name) = &plan.labels
            && let Some(classifier) = &self.classifier
        {
            let reference = select_residues(&entities.partners, &format!("{}_{}", file_stem(entry), name), |residue| {
                classifier.test_residue(residue)
            });
            let config = LabelConfig {
                distance_cutoff: self.config.label_distance_cutoff,
                mask_cutoff: self.config.label_mask_cutoff,
                smooth: self.config.smooth_labels,
                mask: self.config.mask_labels,
            };
            let labels = assign_labels(&reference, &mesh, classifier, &config)?;
            bundle.set_labels(name, &labels)?;
        }

        bundle.save(&bundle_path)?;
        if plan.adjacency {
            save_adjacency(&adjacency_path, &mesh)?;
        }
        log::info!("'{}' written to {}", id, bundle_path.display());

        Ok(Outcome {
            id,
            bundle_file,
            updated,
        })
    }

    fn read_structure(&self, entry: &str) -> Result<Structure, Error> {
        let path = self.config.pdb_files_path.join(entry);
        let file = File::open(&path).map_err(|e| io::Error::from_io(e, Some(path.clone())))?;
        let mut structure =
            io::read_pdb_structure(BufReader::new(file), &self.context).map_err(|e| e.with_path(&path))?;
        structure.name = file_stem(entry);
        Ok(structure)
    }

    /// Mesh for this run: the bundle geometry when it is kept, else the cached OFF file, else
    /// a freshly generated surface, which is then cached. An unreadable cached file is deleted
    /// and the surface generated again.
    fn obtain_mesh(
        &self,
        id: &str,
        protein: &Structure,
        bundle: &Bundle,
        plan: &RefreshPlan,
        scratch: &Scratch,
    ) -> Result<Mesh, Error> {
        if !plan.geometry
            && let Some(mesh) = bundle.mesh()?
        {
            return Ok(mesh);
        }

        let cached = self.mesh_path(id);
        if !self.options.refresh && cached.exists() {
            log::info!("'{}': loading mesh from {}", id, cached.display());
            match Mesh::load_off(&cached) {
                Ok(mesh) => return Ok(mesh),
                Err(e) => {
                    log::warn!("'{}': discarding unreadable mesh {}: {}", id, cached.display(), e);
                    if let Err(e) = fs::remove_file(&cached) {
                        log::warn!("could not remove {}: {}", cached.display(), e);
                    }
                }
            }
        }

        let generator = self.mesh_generator.as_deref().ok_or_else(|| {
            Error::config(None, "MESH_GENERATOR is not configured and a surface must be generated")
        })?;
        let params = MeshParameters {
            surface_type: self.config.surface_type.clone(),
            skin_parameter: self.config.skin_parameter,
            grid_scale: self.config.grid_scale,
        };
        let mesh = generator.generate(protein, &params, scratch)?;
        mesh.save_off(&cached)?;
        log::info!(
            "'{}': generated mesh with {} vertices and {} faces",
            id,
            mesh.num_vertices(),
            mesh.num_faces()
        );
        Ok(mesh)
    }

    fn potentials(&self, id: &str, protein: &Structure, scratch: &Scratch) -> Result<Potentials, Error> {
        let dir = self.config.electrostatics_dir()?;
        if !self.options.refresh {
            match load_cached_potentials(dir, id) {
                Ok(Some(potentials)) => {
                    log::info!("'{}': using cached electrostatic grids", id);
                    return Ok(potentials);
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("'{}': discarding unreadable electrostatic grids: {}", id, e);
                    discard_cached_potentials(dir, id);
                }
            }
        }
        log::info!("'{}': computing electrostatics", id);
        Ok(self.solver.solve(protein, scratch, dir)?)
    }

    fn mesh_path(&self, id: &str) -> PathBuf {
        self.config.mesh_files_path.join(format!("{}_mesh.off", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> Config {
        Config::from_json(&format!(
            r#"{{
                "PDB_FILES_PATH": "{0}/pdb",
                "MESH_FILES_PATH": "{0}/mesh",
                "FEATURE_DATA_PATH": "{0}/data",
                "ELECTROSTATICS_PATH": "{0}/es"
            }}"#,
            root.display()
        ))
        .unwrap()
    }

    #[test]
    fn structure_id_strips_the_last_extension() {
        assert_eq!(structure_id("1abc.pdb"), "1abc_protein");
        assert_eq!(structure_id("sub/1abc.clean.pdb"), "1abc.clean_protein");
        assert_eq!(structure_id("1abc"), "1abc_protein");
    }

    #[test]
    fn labels_need_a_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let err = Pipeline::new(config(dir.path()), Options::default(), None).err().unwrap();

        assert!(err.is_fatal_for_run());
    }

    #[test]
    fn electrostatics_need_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.electrostatics_path = None;
        let options = Options {
            labels: false,
            ..Options::default()
        };

        assert!(matches!(Pipeline::new(config.clone(), options, None), Err(Error::Config { .. })));

        let options = Options {
            electrostatics: false,
            ..options
        };
        assert!(Pipeline::new(config, options, None).is_ok());
    }

    #[test]
    fn new_creates_output_directories() {
        let dir = tempfile::tempdir().unwrap();
        let options = Options {
            labels: false,
            ..Options::default()
        };
        Pipeline::new(config(dir.path()), options, None).unwrap();

        for sub in ["mesh", "data", "es"] {
            assert!(dir.path().join(sub).is_dir(), "{} missing", sub);
        }
        assert!(!dir.path().join("pdb").exists());
    }
}
