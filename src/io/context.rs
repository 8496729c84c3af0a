use crate::model::types::StandardResidue;
use std::collections::HashMap;

/// Canonical residue names paired with the standard residue they denote.
const STANDARD_NAMES: &[(&str, StandardResidue)] = &[
    ("ALA", StandardResidue::ALA),
    ("ARG", StandardResidue::ARG),
    ("ASN", StandardResidue::ASN),
    ("ASP", StandardResidue::ASP),
    ("CYS", StandardResidue::CYS),
    ("GLN", StandardResidue::GLN),
    ("GLU", StandardResidue::GLU),
    ("GLY", StandardResidue::GLY),
    ("HIS", StandardResidue::HIS),
    ("ILE", StandardResidue::ILE),
    ("LEU", StandardResidue::LEU),
    ("LYS", StandardResidue::LYS),
    ("MET", StandardResidue::MET),
    ("PHE", StandardResidue::PHE),
    ("PRO", StandardResidue::PRO),
    ("SER", StandardResidue::SER),
    ("THR", StandardResidue::THR),
    ("TRP", StandardResidue::TRP),
    ("TYR", StandardResidue::TYR),
    ("VAL", StandardResidue::VAL),
    ("DA", StandardResidue::DA),
    ("DC", StandardResidue::DC),
    ("DG", StandardResidue::DG),
    ("DT", StandardResidue::DT),
    ("DI", StandardResidue::DI),
    ("A", StandardResidue::A),
    ("C", StandardResidue::C),
    ("G", StandardResidue::G),
    ("U", StandardResidue::U),
    ("I", StandardResidue::I),
    ("HOH", StandardResidue::HOH),
];

/// Protonation states, force-field terminal variants, and legacy spellings.
const ALIASES: &[(&str, &str)] = &[
    ("ARN", "ARG"),
    ("ASH", "ASP"),
    ("CYM", "CYS"),
    ("CYX", "CYS"),
    ("GLH", "GLU"),
    ("HID", "HIS"),
    ("HIE", "HIS"),
    ("HIP", "HIS"),
    ("HSD", "HIS"),
    ("HSE", "HIS"),
    ("HSP", "HIS"),
    ("LYN", "LYS"),
    ("TYM", "TYR"),
    ("MSE", "MET"),
    ("DA5", "DA"),
    ("DA3", "DA"),
    ("DC5", "DC"),
    ("DC3", "DC"),
    ("DG5", "DG"),
    ("DG3", "DG"),
    ("DT5", "DT"),
    ("DT3", "DT"),
    ("ADE", "DA"),
    ("CYT", "DC"),
    ("GUA", "DG"),
    ("THY", "DT"),
    ("RA5", "A"),
    ("RA3", "A"),
    ("RC5", "C"),
    ("RC3", "C"),
    ("RG5", "G"),
    ("RG3", "G"),
    ("RU5", "U"),
    ("RU3", "U"),
    ("URA", "U"),
    ("WAT", "HOH"),
    ("SOL", "HOH"),
    ("H2O", "HOH"),
    ("TIP", "HOH"),
    ("TIP3", "HOH"),
];

/// Residue-name resolution shared by the structure readers.
///
/// Raw names are first mapped through the alias table to a canonical name, which is then
/// looked up among the standard residues. Names that are neither aliases nor standard pass
/// through unchanged so ligands keep their identifiers.
#[derive(Debug, Clone)]
pub struct IoContext {
    alias_map: HashMap<String, String>,
    standard_map: HashMap<String, StandardResidue>,
}

impl IoContext {
    pub fn new_default() -> Self {
        let standard_map: HashMap<String, StandardResidue> = STANDARD_NAMES
            .iter()
            .map(|(name, std)| (name.to_string(), *std))
            .collect();
        let alias_map = ALIASES
            .iter()
            .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
            .collect();

        Self {
            alias_map,
            standard_map,
        }
    }

    pub fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias_map.get(name).map(|s| s.as_str()).unwrap_or(name)
    }

    pub fn map_to_standard(&self, name: &str) -> Option<StandardResidue> {
        self.standard_map.get(name).copied()
    }

    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.alias_map.insert(alias.into(), canonical.into());
    }

    /// Resolves a raw residue name to its canonical spelling and standard identity.
    pub fn classify_residue(&self, raw_name: &str) -> (String, Option<StandardResidue>) {
        let upper = raw_name.trim().to_ascii_uppercase();
        let canonical = self.resolve_name(&upper);
        let standard = self.map_to_standard(canonical);
        (canonical.to_string(), standard)
    }
}

impl Default for IoContext {
    fn default() -> Self {
        Self::new_default()
    }
}
