//! Receptor cleanup applied before surface generation.
//!
//! The surface must wrap the polymer alone: crystallographic waters, ions, and bound hetero
//! groups would otherwise be folded into the triangulated envelope. Hydrogens are optional
//! because most deposited structures lack them and the downstream tools treat them
//! inconsistently.

use crate::model::structure::Structure;
use crate::model::types::ResidueCategory;
use crate::ops::error::Error;
use std::collections::HashSet;

/// Switches describing which components are removed during cleaning.
#[derive(Debug, Clone, Default)]
pub struct CleanConfig {
    /// Strip waters.
    pub remove_water: bool,
    /// Strip single-atom ion residues.
    pub remove_ions: bool,
    /// Strip multi-atom hetero groups.
    pub remove_hetero: bool,
    /// Strip hydrogen and deuterium atoms from retained residues.
    pub remove_hydrogens: bool,
    /// Residue names that survive regardless of the category switches.
    pub keep_residue_names: HashSet<String>,
}

impl CleanConfig {
    /// Removes everything except polymer residues; hydrogens are kept only when requested.
    pub fn receptor(keep_hydrogens: bool) -> Self {
        Self {
            remove_water: true,
            remove_ions: true,
            remove_hetero: true,
            remove_hydrogens: !keep_hydrogens,
            keep_residue_names: HashSet::new(),
        }
    }
}

/// Applies the cleaning rules in place and drops chains left empty.
///
/// # Errors
///
/// Returns [`Error::NoAtoms`] when nothing survives, since an empty receptor cannot be
/// meshed.
pub fn clean_structure(structure: &mut Structure, config: &CleanConfig) -> Result<(), Error> {
    let before = structure.atom_count();

    structure.retain_residues(|_chain_id, residue| {
        let keep = if config.keep_residue_names.contains(residue.name.as_str()) {
            true
        } else if residue.is_water() {
            !config.remove_water
        } else {
            match residue.category {
                ResidueCategory::Ion => !config.remove_ions,
                ResidueCategory::Hetero => !config.remove_hetero,
                ResidueCategory::Standard => true,
            }
        };

        if keep && config.remove_hydrogens {
            residue.strip_hydrogens();
        }
        keep && !residue.is_empty()
    });

    let after = structure.atom_count();
    log::debug!(
        "cleaned '{}': kept {} of {} atoms",
        structure.name,
        after,
        before
    );

    if after == 0 {
        return Err(Error::no_atoms(&structure.name, "surface generation"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        atom::Atom,
        chain::Chain,
        residue::Residue,
        types::{Element, Point, StandardResidue},
    };

    fn make_structure(residues: Vec<(&str, ResidueCategory, Option<StandardResidue>)>) -> Structure {
        let mut structure = Structure::new("test");
        let mut chain = Chain::new("A");

        for (idx, (name, category, standard)) in residues.into_iter().enumerate() {
            let mut residue = Residue::new(idx as i32 + 1, None, name, standard, category);
            residue.add_atom(Atom::new("C", Element::C, Point::origin()));
            residue.add_atom(Atom::new("H", Element::H, Point::new(1.0, 0.0, 0.0)));
            chain.add_residue(residue);
        }

        structure.add_chain(chain);
        structure
    }

    fn sample() -> Structure {
        make_structure(vec![
            ("HOH", ResidueCategory::Standard, Some(StandardResidue::HOH)),
            ("NA", ResidueCategory::Ion, None),
            ("ATP", ResidueCategory::Hetero, None),
            ("GLY", ResidueCategory::Standard, Some(StandardResidue::GLY)),
        ])
    }

    #[test]
    fn receptor_config_keeps_only_polymer_heavy_atoms() {
        let mut structure = sample();

        clean_structure(&mut structure, &CleanConfig::receptor(false)).unwrap();

        let chain = structure.chain("A").unwrap();
        let names: Vec<_> = chain.iter_residues().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["GLY"]);
        assert_eq!(structure.atom_count(), 1);
    }

    #[test]
    fn receptor_config_can_keep_hydrogens() {
        let mut structure = sample();

        clean_structure(&mut structure, &CleanConfig::receptor(true)).unwrap();

        assert_eq!(structure.atom_count(), 2);
    }

    #[test]
    fn keep_list_overrides_category_rules() {
        let mut structure = sample();
        let mut config = CleanConfig::receptor(false);
        config.keep_residue_names.insert("ATP".to_string());

        clean_structure(&mut structure, &config).unwrap();

        let names: Vec<_> = structure
            .chain("A")
            .unwrap()
            .iter_residues()
            .map(|r| r.name.clone())
            .collect();
        assert_eq!(names, vec!["ATP", "GLY"]);
    }

    #[test]
    fn default_config_removes_nothing() {
        let mut structure = sample();

        clean_structure(&mut structure, &CleanConfig::default()).unwrap();

        assert_eq!(structure.residue_count(), 4);
        assert_eq!(structure.atom_count(), 8);
    }

    #[test]
    fn empty_result_is_an_error() {
        let mut structure = make_structure(vec![("HOH", ResidueCategory::Standard, Some(StandardResidue::HOH))]);

        let err = clean_structure(&mut structure, &CleanConfig::receptor(false)).unwrap_err();
        assert!(matches!(err, Error::NoAtoms { .. }));
        assert!(structure.is_empty());
    }
}
