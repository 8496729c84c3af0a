//! Internal database API over the embedded data tables.
//!
//! Residue property tables back the atom-level feature providers, and the built-in atom
//! class sets back the classifier. Both are parsed once from TOML compiled into the binary.

mod loader;
mod schema;
mod store;

pub use schema::{ClassEntry, ClassSetFile, RuleEntry};

/// Retrieves the property record of a standard amino acid by its canonical name.
///
/// # Arguments
///
/// * `name` - Residue identifier such as `"ALA"`.
///
/// # Returns
///
/// `Some(ResidueView)` when the residue is tabulated, otherwise `None`.
pub fn residue_properties(name: &str) -> Option<ResidueView<'static>> {
    store::get_store()
        .residues_by_name
        .get(name)
        .map(|inner| ResidueView { inner })
}

/// Looks up a built-in atom class set by name.
pub fn builtin_class_set(name: &str) -> Option<&'static ClassSetFile> {
    store::get_store().class_sets.get(name)
}

/// Names of all built-in atom class sets, sorted.
pub fn builtin_class_set_names() -> impl Iterator<Item = &'static str> {
    store::get_store().class_sets.keys().map(|k| k.as_str())
}

/// Read-only handle over a tabulated residue.
#[derive(Debug, Clone, Copy)]
pub struct ResidueView<'a> {
    inner: &'a store::InternalResidue,
}

impl<'a> ResidueView<'a> {
    pub fn name(&self) -> &'a str {
        &self.inner.props.name
    }

    /// Kyte-Doolittle hydropathy index.
    pub fn hydrophobicity(&self) -> f64 {
        self.inner.props.hydrophobicity
    }

    /// Solvent accessible area of the fully exposed residue, in square ångströms.
    pub fn max_sasa(&self) -> f64 {
        self.inner.props.max_sasa
    }

    pub fn atchley_factors(&self) -> [f64; 5] {
        self.inner.props.atchley
    }

    /// Whether the named atom can donate a hydrogen bond, backbone included.
    pub fn is_donor(&self, atom_name: &str) -> bool {
        self.inner.donors.contains(atom_name)
    }

    /// Whether the named atom can accept a hydrogen bond, backbone included.
    pub fn is_acceptor(&self, atom_name: &str) -> bool {
        self.inner.acceptors.contains(atom_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_table_covers_standard_amino_acids() {
        for name in [
            "ALA", "ARG", "ASN", "ASP", "CYS", "GLN", "GLU", "GLY", "HIS", "ILE", "LEU", "LYS",
            "MET", "PHE", "PRO", "SER", "THR", "TRP", "TYR", "VAL",
        ] {
            let view = residue_properties(name);
            assert!(view.is_some(), "Residue '{}' should be tabulated", name);
            assert_eq!(view.unwrap().name(), name);
        }
        assert!(residue_properties("HOH").is_none());
    }

    #[test]
    fn residue_view_reports_published_values() {
        let ile = residue_properties("ILE").unwrap();
        assert!((ile.hydrophobicity() - 4.5).abs() < 1e-12);
        assert!((ile.max_sasa() - 197.0).abs() < 1e-12);

        let ala = residue_properties("ALA").unwrap();
        assert_eq!(ala.atchley_factors(), [-0.591, -1.302, -0.733, 1.570, -0.146]);
    }

    #[test]
    fn hydrogen_bond_sites_include_backbone() {
        let ser = residue_properties("SER").unwrap();
        assert!(ser.is_donor("N"));
        assert!(ser.is_donor("OG"));
        assert!(ser.is_acceptor("O"));
        assert!(ser.is_acceptor("OG"));
        assert!(!ser.is_donor("CB"));
    }

    #[test]
    fn proline_backbone_nitrogen_is_not_a_donor() {
        let pro = residue_properties("PRO").unwrap();
        assert!(!pro.is_donor("N"));
        assert!(pro.is_acceptor("O"));
    }

    #[test]
    fn builtin_class_sets_are_available() {
        let names: Vec<&str> = builtin_class_set_names().collect();
        assert_eq!(
            names,
            vec![
                "BINARY_STANDARD_DNA",
                "MULTICLASS_STANDARD_DSDNA",
                "MULTICLASS_STANDARD_SSDNA"
            ]
        );

        let binary = builtin_class_set("BINARY_STANDARD_DNA").unwrap();
        assert_eq!(binary.default, "none");
        assert_eq!(binary.classes.len(), 1);
        assert_eq!(binary.classes[0].name, "dna");
        assert!(builtin_class_set("UNKNOWN").is_none());
    }
}
