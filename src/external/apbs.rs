//! Poisson-Boltzmann electrostatics through PDB2PQR and APBS.

use super::command::CommandSpec;
use super::error::Error;
use super::scratch::Scratch;
use crate::io::{self, ScalarGrid};
use crate::model::structure::Structure;
use crate::model::types::Point;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const PDB2PQR: &str = "pdb2pqr";
const APBS: &str = "apbs";

/// Electrostatic potential and solvent accessibility grids for one structure.
#[derive(Debug, Clone)]
pub struct Potentials {
    pub potential: ScalarGrid,
    pub accessibility: ScalarGrid,
}

/// Paths of the cached grids of structure `id` under `dir`.
pub fn potential_paths(dir: &Path, id: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{}_potential.dx", id)),
        dir.join(format!("{}_access.dx", id)),
    )
}

/// Loads previously computed grids, if both exist.
pub fn load_cached_potentials(dir: &Path, id: &str) -> Result<Option<Potentials>, Error> {
    let (pot, acc) = potential_paths(dir, id);
    if !(pot.exists() && acc.exists()) {
        return Ok(None);
    }
    Ok(Some(Potentials {
        potential: read_grid(&pot)?,
        accessibility: read_grid(&acc)?,
    }))
}

/// Removes the cached grids of structure `id`, logging files that cannot be deleted.
pub fn discard_cached_potentials(dir: &Path, id: &str) {
    let (pot, acc) = potential_paths(dir, id);
    for path in [pot, acc] {
        if path.exists()
            && let Err(e) = fs::remove_file(&path)
        {
            log::warn!("could not remove stale grid {}: {}", path.display(), e);
        }
    }
}

fn read_grid(path: &Path) -> Result<ScalarGrid, Error> {
    let file = File::open(path).map_err(|e| io::Error::from_io(e, Some(path.to_path_buf())))?;
    io::read_dx_grid(BufReader::new(file)).map_err(|e| Error::from(e.with_path(path)))
}

/// Computes electrostatic grids for a structure.
///
/// Implementations write `<id>_potential.dx` and `<id>_access.dx` into `out_dir` so later runs
/// can reuse them.
pub trait ElectrostaticsSolver: Send + Sync {
    fn solve(
        &self,
        structure: &Structure,
        scratch: &Scratch,
        out_dir: &Path,
    ) -> Result<Potentials, Error>;
}

/// Runs PDB2PQR to assign charges and radii, then APBS to solve the linearised
/// Poisson-Boltzmann equation.
///
/// A failed attempt removes any grids it may have left in `out_dir` and is retried once.
#[derive(Debug, Clone)]
pub struct ApbsSolver {
    pub pdb2pqr: CommandSpec,
    pub apbs: CommandSpec,
    pub force_field: String,
    /// Target fine-grid spacing, in ångströms.
    pub grid_spacing: f64,
    /// Margin added around the structure for the fine grid, in ångströms.
    pub padding: f64,
}

impl Default for ApbsSolver {
    fn default() -> Self {
        Self {
            pdb2pqr: CommandSpec {
                program: "pdb2pqr".to_string(),
                args: vec![
                    "--ff={force_field}".to_string(),
                    "{input}".to_string(),
                    "{output}".to_string(),
                ],
            },
            apbs: CommandSpec {
                program: "apbs".to_string(),
                args: vec!["{input}".to_string()],
            },
            force_field: "AMBER".to_string(),
            grid_spacing: 0.5,
            padding: 10.0,
        }
    }
}

impl ElectrostaticsSolver for ApbsSolver {
    fn solve(
        &self,
        structure: &Structure,
        scratch: &Scratch,
        out_dir: &Path,
    ) -> Result<Potentials, Error> {
        match self.solve_once(structure, scratch, out_dir) {
            Ok(potentials) => Ok(potentials),
            Err(first) => {
                log::warn!(
                    "electrostatics failed for '{}' ({}); retrying once",
                    scratch.id(),
                    first
                );
                discard_cached_potentials(out_dir, scratch.id());
                let result = self.solve_once(structure, scratch, out_dir);
                if result.is_err() {
                    discard_cached_potentials(out_dir, scratch.id());
                }
                result
            }
        }
    }
}

impl ApbsSolver {
    fn solve_once(
        &self,
        structure: &Structure,
        scratch: &Scratch,
        out_dir: &Path,
    ) -> Result<Potentials, Error> {
        let pdb = scratch.file(".pdb");
        let pqr = scratch.file(".pqr");
        let deck = scratch.file(".in");

        let file = File::create(&pdb).map_err(|e| io::Error::from_io(e, Some(pdb.clone())))?;
        io::write_pdb_structure(BufWriter::new(file), structure).map_err(|e| e.with_path(&pdb))?;

        self.pdb2pqr.run(
            PDB2PQR,
            &[
                ("input", pdb.display().to_string()),
                ("output", pqr.display().to_string()),
                ("force_field", self.force_field.clone()),
            ],
            scratch.path(),
        )?;
        if !pqr.exists() {
            return Err(Error::missing_output(PDB2PQR, pqr));
        }

        let (pot, acc) = potential_paths(out_dir, scratch.id());
        let text = self.input_deck(structure, &pqr, &pot, &acc);
        fs::write(&deck, text).map_err(|e| io::Error::from_io(e, Some(deck.clone())))?;

        self.apbs.run(APBS, &[("input", deck.display().to_string())], scratch.path())?;
        for path in [&pot, &acc] {
            if !path.exists() {
                return Err(Error::missing_output(APBS, path.as_path()));
            }
        }

        log::info!("computed electrostatics for '{}'", scratch.id());
        Ok(Potentials {
            potential: read_grid(&pot)?,
            accessibility: read_grid(&acc)?,
        })
    }

    /// Builds an `mg-auto` APBS input deck sized to the structure.
    ///
    /// APBS appends `.dx` to the `write` stems, so the grids land at `pot` and `acc`.
    pub fn input_deck(&self, structure: &Structure, pqr: &Path, pot: &Path, acc: &Path) -> String {
        let (min, max) = bounds(structure);
        let extent = max - min;

        let mut fglen = [0.0; 3];
        let mut cglen = [0.0; 3];
        let mut dime = [0usize; 3];
        for axis in 0..3 {
            fglen[axis] = extent[axis] + 2.0 * self.padding;
            cglen[axis] = 1.7 * fglen[axis];
            dime[axis] = grid_points(fglen[axis], self.grid_spacing);
        }

        let stem = |p: &Path| p.with_extension("").display().to_string();
        let mut deck = String::new();
        let mut line = |s: String| {
            deck.push_str(&s);
            deck.push('\n');
        };
        line("read".into());
        line(format!("    mol pqr {}", pqr.display()));
        line("end".into());
        line("elec name surface".into());
        line("    mg-auto".into());
        line(format!("    dime {} {} {}", dime[0], dime[1], dime[2]));
        line(format!("    cglen {:.3} {:.3} {:.3}", cglen[0], cglen[1], cglen[2]));
        line(format!("    fglen {:.3} {:.3} {:.3}", fglen[0], fglen[1], fglen[2]));
        line("    cgcent mol 1".into());
        line("    fgcent mol 1".into());
        line("    mol 1".into());
        line("    lpbe".into());
        line("    bcfl sdh".into());
        line("    ion charge 1 conc 0.150 radius 2.0".into());
        line("    ion charge -1 conc 0.150 radius 2.0".into());
        line("    pdie 2.0".into());
        line("    sdie 78.54".into());
        line("    srfm smol".into());
        line("    chgm spl2".into());
        line("    sdens 10.0".into());
        line("    srad 1.4".into());
        line("    swin 0.3".into());
        line("    temp 298.15".into());
        line("    calcenergy no".into());
        line("    calcforce no".into());
        line(format!("    write pot dx {}", stem(pot)));
        line(format!("    write smol dx {}", stem(acc)));
        line("end".into());
        line("quit".into());
        deck
    }
}

fn bounds(structure: &Structure) -> (Point, Point) {
    let mut min = Point::new(f64::MAX, f64::MAX, f64::MAX);
    let mut max = Point::new(f64::MIN, f64::MIN, f64::MIN);
    for atom in structure.iter_atoms() {
        min = min.inf(&atom.pos);
        max = max.sup(&atom.pos);
    }
    if min.x > max.x {
        return (Point::origin(), Point::origin());
    }
    (min, max)
}

/// Smallest multigrid-compatible point count (`32k + 1`, at least 65) covering `length` at
/// `spacing`.
fn grid_points(length: f64, spacing: f64) -> usize {
    let needed = (length / spacing).ceil() as usize + 1;
    let k = needed.saturating_sub(1).div_ceil(32).max(2);
    32 * k + 1
}
