use super::atom::Atom;
use super::types::{ResidueCategory, StandardResidue};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub id: i32,
    pub insertion_code: Option<char>,
    pub name: String,
    pub standard_name: Option<StandardResidue>,
    pub category: ResidueCategory,
    atoms: Vec<Atom>,
}

impl Residue {
    pub fn new(
        id: i32,
        insertion_code: Option<char>,
        name: &str,
        standard_name: Option<StandardResidue>,
        category: ResidueCategory,
    ) -> Self {
        Self {
            id,
            insertion_code,
            name: name.to_string(),
            standard_name,
            category,
            atoms: Vec::new(),
        }
    }

    pub fn is_standard(&self) -> bool {
        self.standard_name.is_some()
    }

    pub fn is_protein(&self) -> bool {
        self.standard_name.is_some_and(|s| s.is_protein())
    }

    pub fn is_nucleic(&self) -> bool {
        self.standard_name.is_some_and(|s| s.is_nucleic())
    }

    pub fn is_water(&self) -> bool {
        self.standard_name == Some(StandardResidue::HOH)
    }

    pub fn add_atom(&mut self, atom: Atom) {
        debug_assert!(
            self.atom(&atom.name).is_none(),
            "Attempted to add a duplicate atom name '{}' to residue '{}'",
            atom.name,
            self.name
        );
        self.atoms.push(atom);
    }

    pub fn atom(&self, name: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.name == name)
    }

    pub fn has_atom(&self, name: &str) -> bool {
        self.atom(name).is_some()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn iter_atoms(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    pub fn strip_hydrogens(&mut self) {
        self.atoms.retain(|a| !a.is_hydrogen());
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icode = self.insertion_code.map(String::from).unwrap_or_default();
        write!(
            f,
            "Residue {{ id: {}{}, name: \"{}\", category: {}, atoms: {} }}",
            self.id,
            icode,
            self.name,
            self.category,
            self.atom_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Element, Point};

    fn sample_residue() -> Residue {
        let mut residue = Residue::new(
            7,
            None,
            "SER",
            Some(StandardResidue::SER),
            ResidueCategory::Standard,
        );
        residue.add_atom(Atom::new("N", Element::N, Point::new(0.0, 0.0, 0.0)));
        residue.add_atom(Atom::new("OG", Element::O, Point::new(1.0, 0.0, 0.0)));
        residue.add_atom(Atom::new("HG", Element::H, Point::new(1.5, 0.5, 0.0)));
        residue
    }

    #[test]
    fn residue_new_starts_empty() {
        let residue = Residue::new(1, Some('A'), "LIG", None, ResidueCategory::Hetero);

        assert!(residue.is_empty());
        assert!(!residue.is_standard());
        assert_eq!(residue.insertion_code, Some('A'));
    }

    #[test]
    fn residue_atom_lookup_finds_by_name() {
        let residue = sample_residue();

        assert!(residue.has_atom("OG"));
        assert!(!residue.has_atom("CB"));
        assert_eq!(residue.atom("N").unwrap().element, Element::N);
    }

    #[test]
    fn residue_strip_hydrogens_removes_only_hydrogens() {
        let mut residue = sample_residue();
        residue.strip_hydrogens();

        assert_eq!(residue.atom_count(), 2);
        assert!(!residue.has_atom("HG"));
    }

    #[test]
    fn residue_polymer_predicates_follow_standard_name() {
        let residue = sample_residue();
        assert!(residue.is_protein());
        assert!(!residue.is_nucleic());

        let dna = Residue::new(1, None, "DA", Some(StandardResidue::DA), ResidueCategory::Standard);
        assert!(dna.is_nucleic());

        let water = Residue::new(
            2,
            None,
            "HOH",
            Some(StandardResidue::HOH),
            ResidueCategory::Standard,
        );
        assert!(water.is_water());
    }

    #[test]
    fn residue_display_includes_insertion_code() {
        let residue = Residue::new(12, Some('B'), "GLY", None, ResidueCategory::Hetero);
        assert_eq!(
            residue.to_string(),
            "Residue { id: 12B, name: \"GLY\", category: Hetero Residue, atoms: 0 }"
        );
    }
}
