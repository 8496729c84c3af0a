//! Fundamental atom representation comprising name, chemical element, and Cartesian position.
//!
//! Atoms are created by the PDB reader and never mutated afterwards by the surface pipeline:
//! feature providers, the feature mapper, and the label assigner only read positions and
//! identities. Distance helpers keep the vector math inside the type.

use super::types::{Element, Point};
use smol_str::SmolStr;
use std::fmt;

/// Labeled atom with element identity and Cartesian position.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// Atom name as it appears in crystallographic or modeling files (e.g., `CA`).
    pub name: SmolStr,
    /// Chemical element.
    pub element: Element,
    /// Cartesian coordinates measured in ångströms.
    pub pos: Point,
}

impl Atom {
    /// Creates a new atom from a name, element, and position.
    ///
    /// # Arguments
    ///
    /// * `name` - Atom label such as `"CA"` or `"OP1"`.
    /// * `element` - `Element` variant describing the chemical identity.
    /// * `pos` - `Point` describing the Cartesian coordinates in ångströms.
    pub fn new(name: &str, element: Element, pos: Point) -> Self {
        Self {
            name: SmolStr::new(name),
            element,
            pos,
        }
    }

    /// Returns `true` when the atom is a hydrogen (or deuterium).
    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }

    /// Computes the squared Euclidean distance to an arbitrary point.
    ///
    /// Prefer this when comparing relative distances, as it avoids the square root.
    pub fn distance_squared_to(&self, point: &Point) -> f64 {
        nalgebra::distance_squared(&self.pos, point)
    }

    /// Computes the Euclidean distance to an arbitrary point in ångströms.
    pub fn distance_to(&self, point: &Point) -> f64 {
        nalgebra::distance(&self.pos, point)
    }

    /// Computes the Euclidean distance to another atom in ångströms.
    pub fn distance(&self, other: &Atom) -> f64 {
        self.distance_to(&other.pos)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atom {{ name: \"{}\", element: {}, pos: [{:.3}, {:.3}, {:.3}] }}",
            self.name, self.element, self.pos.x, self.pos.y, self.pos.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_new_creates_correct_atom() {
        let pos = Point::new(1.0, 2.0, 3.0);
        let atom = Atom::new("C1'", Element::C, pos);

        assert_eq!(atom.name, "C1'");
        assert_eq!(atom.element, Element::C);
        assert_eq!(atom.pos, pos);
    }

    #[test]
    fn atom_distance_to_point_calculates_correctly() {
        let atom = Atom::new("A", Element::N, Point::new(0.0, 0.0, 0.0));
        let point = Point::new(3.0, 4.0, 0.0);

        assert!((atom.distance_squared_to(&point) - 25.0).abs() < 1e-10);
        assert!((atom.distance_to(&point) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn atom_distance_between_atoms_is_symmetric() {
        let a = Atom::new("A", Element::O, Point::new(-1.0, -2.0, -3.0));
        let b = Atom::new("B", Element::O, Point::new(1.0, 2.0, 3.0));

        assert!((a.distance(&b) - 56.0_f64.sqrt()).abs() < 1e-10);
        assert!((a.distance(&b) - b.distance(&a)).abs() < 1e-12);
    }

    #[test]
    fn atom_is_hydrogen_reflects_element() {
        assert!(Atom::new("H1", Element::H, Point::origin()).is_hydrogen());
        assert!(!Atom::new("CA", Element::C, Point::origin()).is_hydrogen());
    }

    #[test]
    fn atom_display_formats_correctly() {
        let atom = Atom::new("CA", Element::C, Point::new(1.234, -5.678, 9.012));
        let expected = "Atom { name: \"CA\", element: C, pos: [1.234, -5.678, 9.012] }";

        assert_eq!(atom.to_string(), expected);
    }
}
