use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

pub type Point = Point3<f64>;

/// Chemical elements encountered in macromolecular structure files.
///
/// The set is intentionally limited to the elements that appear in proteins, nucleic acids,
/// common cofactors, and crystallization ions. Anything else parses to [`Element::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Element {
    H = 1,
    B = 5,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Na = 11,
    Mg = 12,
    P = 15,
    S = 16,
    Cl = 17,
    K = 19,
    Ca = 20,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Se = 34,
    Br = 35,
    Cd = 48,
    I = 53,
    Hg = 80,
    Unknown = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardResidue {
    ALA,
    ARG,
    ASN,
    ASP,
    CYS,
    GLN,
    GLU,
    GLY,
    HIS,
    ILE,
    LEU,
    LYS,
    MET,
    PHE,
    PRO,
    SER,
    THR,
    TRP,
    TYR,
    VAL,
    A,
    C,
    G,
    U,
    I,
    DA,
    DC,
    DG,
    DT,
    DI,
    HOH,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidueCategory {
    Standard,
    Hetero,
    Ion,
}

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Co => "Co",
            Element::Ni => "Ni",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::Cd => "Cd",
            Element::I => "I",
            Element::Hg => "Hg",
            Element::Unknown => "Unknown",
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        matches!(self, Element::H)
    }

    /// Bondi van der Waals radius in ångströms.
    ///
    /// Metals without a tabulated Bondi value fall back to 1.5 Å, and unknown elements use the
    /// carbon radius so surface generation still sees a sensible sphere.
    pub fn vdw_radius(&self) -> f64 {
        match self {
            Element::H => 1.20,
            Element::B => 1.92,
            Element::C => 1.70,
            Element::N => 1.55,
            Element::O => 1.52,
            Element::F => 1.47,
            Element::Na => 2.27,
            Element::Mg => 1.73,
            Element::P => 1.80,
            Element::S => 1.80,
            Element::Cl => 1.75,
            Element::K => 2.75,
            Element::Ni => 1.63,
            Element::Cu => 1.40,
            Element::Zn => 1.39,
            Element::Se => 1.90,
            Element::Br => 1.85,
            Element::Cd => 1.58,
            Element::I => 1.98,
            Element::Hg => 1.55,
            Element::Ca | Element::Mn | Element::Fe | Element::Co => 1.50,
            Element::Unknown => 1.70,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Empty element symbol".to_string());
        }

        let mut normalized = String::with_capacity(trimmed.len());
        for (i, c) in trimmed.chars().enumerate() {
            if i == 0 {
                normalized.push(c.to_ascii_uppercase());
            } else {
                normalized.push(c.to_ascii_lowercase());
            }
        }

        match normalized.as_str() {
            "H" | "D" => Ok(Element::H),
            "B" => Ok(Element::B),
            "C" => Ok(Element::C),
            "N" => Ok(Element::N),
            "O" => Ok(Element::O),
            "F" => Ok(Element::F),
            "Na" => Ok(Element::Na),
            "Mg" => Ok(Element::Mg),
            "P" => Ok(Element::P),
            "S" => Ok(Element::S),
            "Cl" => Ok(Element::Cl),
            "K" => Ok(Element::K),
            "Ca" => Ok(Element::Ca),
            "Mn" => Ok(Element::Mn),
            "Fe" => Ok(Element::Fe),
            "Co" => Ok(Element::Co),
            "Ni" => Ok(Element::Ni),
            "Cu" => Ok(Element::Cu),
            "Zn" => Ok(Element::Zn),
            "Se" => Ok(Element::Se),
            "Br" => Ok(Element::Br),
            "Cd" => Ok(Element::Cd),
            "I" => Ok(Element::I),
            "Hg" => Ok(Element::Hg),
            _ => Err(format!("Unsupported element symbol: {}", s)),
        }
    }
}

impl StandardResidue {
    pub fn is_protein(&self) -> bool {
        matches!(
            self,
            StandardResidue::ALA
                | StandardResidue::ARG
                | StandardResidue::ASN
                | StandardResidue::ASP
                | StandardResidue::CYS
                | StandardResidue::GLN
                | StandardResidue::GLU
                | StandardResidue::GLY
                | StandardResidue::HIS
                | StandardResidue::ILE
                | StandardResidue::LEU
                | StandardResidue::LYS
                | StandardResidue::MET
                | StandardResidue::PHE
                | StandardResidue::PRO
                | StandardResidue::SER
                | StandardResidue::THR
                | StandardResidue::TRP
                | StandardResidue::TYR
                | StandardResidue::VAL
        )
    }

    pub fn is_nucleic(&self) -> bool {
        matches!(
            self,
            StandardResidue::A
                | StandardResidue::C
                | StandardResidue::G
                | StandardResidue::U
                | StandardResidue::I
                | StandardResidue::DA
                | StandardResidue::DC
                | StandardResidue::DG
                | StandardResidue::DT
                | StandardResidue::DI
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            StandardResidue::ALA => "ALA",
            StandardResidue::ARG => "ARG",
            StandardResidue::ASN => "ASN",
            StandardResidue::ASP => "ASP",
            StandardResidue::CYS => "CYS",
            StandardResidue::GLN => "GLN",
            StandardResidue::GLU => "GLU",
            StandardResidue::GLY => "GLY",
            StandardResidue::HIS => "HIS",
            StandardResidue::ILE => "ILE",
            StandardResidue::LEU => "LEU",
            StandardResidue::LYS => "LYS",
            StandardResidue::MET => "MET",
            StandardResidue::PHE => "PHE",
            StandardResidue::PRO => "PRO",
            StandardResidue::SER => "SER",
            StandardResidue::THR => "THR",
            StandardResidue::TRP => "TRP",
            StandardResidue::TYR => "TYR",
            StandardResidue::VAL => "VAL",
            StandardResidue::A => "A",
            StandardResidue::C => "C",
            StandardResidue::G => "G",
            StandardResidue::U => "U",
            StandardResidue::I => "I",
            StandardResidue::DA => "DA",
            StandardResidue::DC => "DC",
            StandardResidue::DG => "DG",
            StandardResidue::DT => "DT",
            StandardResidue::DI => "DI",
            StandardResidue::HOH => "HOH",
        }
    }
}

impl fmt::Display for StandardResidue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for StandardResidue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALA" => Ok(StandardResidue::ALA),
            "ARG" => Ok(StandardResidue::ARG),
            "ASN" => Ok(StandardResidue::ASN),
            "ASP" => Ok(StandardResidue::ASP),
            "CYS" => Ok(StandardResidue::CYS),
            "GLN" => Ok(StandardResidue::GLN),
            "GLU" => Ok(StandardResidue::GLU),
            "GLY" => Ok(StandardResidue::GLY),
            "HIS" => Ok(StandardResidue::HIS),
            "ILE" => Ok(StandardResidue::ILE),
            "LEU" => Ok(StandardResidue::LEU),
            "LYS" => Ok(StandardResidue::LYS),
            "MET" => Ok(StandardResidue::MET),
            "PHE" => Ok(StandardResidue::PHE),
            "PRO" => Ok(StandardResidue::PRO),
            "SER" => Ok(StandardResidue::SER),
            "THR" => Ok(StandardResidue::THR),
            "TRP" => Ok(StandardResidue::TRP),
            "TYR" => Ok(StandardResidue::TYR),
            "VAL" => Ok(StandardResidue::VAL),
            "A" => Ok(StandardResidue::A),
            "C" => Ok(StandardResidue::C),
            "G" => Ok(StandardResidue::G),
            "U" => Ok(StandardResidue::U),
            "I" => Ok(StandardResidue::I),
            "DA" => Ok(StandardResidue::DA),
            "DC" => Ok(StandardResidue::DC),
            "DG" => Ok(StandardResidue::DG),
            "DT" => Ok(StandardResidue::DT),
            "DI" => Ok(StandardResidue::DI),
            "HOH" => Ok(StandardResidue::HOH),
            _ => Err(format!("Invalid standard residue: {}", s)),
        }
    }
}

impl ResidueCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ResidueCategory::Standard => "Standard Residue",
            ResidueCategory::Hetero => "Hetero Residue",
            ResidueCategory::Ion => "Ion",
        }
    }
}

impl fmt::Display for ResidueCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_from_str_normalizes_case() {
        assert_eq!(Element::from_str("ZN"), Ok(Element::Zn));
        assert_eq!(Element::from_str("zn"), Ok(Element::Zn));
        assert_eq!(Element::from_str(" C "), Ok(Element::C));
        assert_eq!(Element::from_str("D"), Ok(Element::H));
    }

    #[test]
    fn element_from_str_rejects_unsupported_symbols() {
        assert!(Element::from_str("Xx").is_err());
        assert!(Element::from_str("").is_err());
    }

    #[test]
    fn element_vdw_radius_matches_bondi_values() {
        assert!((Element::C.vdw_radius() - 1.70).abs() < 1e-12);
        assert!((Element::O.vdw_radius() - 1.52).abs() < 1e-12);
        assert!((Element::Unknown.vdw_radius() - 1.70).abs() < 1e-12);
    }

    #[test]
    fn element_display_uses_symbol() {
        assert_eq!(Element::Cl.to_string(), "Cl");
        assert_eq!(Element::Unknown.to_string(), "Unknown");
    }

    #[test]
    fn standard_residue_partitions_protein_and_nucleic() {
        assert!(StandardResidue::ALA.is_protein());
        assert!(!StandardResidue::ALA.is_nucleic());
        assert!(StandardResidue::DA.is_nucleic());
        assert!(StandardResidue::U.is_nucleic());
        assert!(!StandardResidue::HOH.is_protein());
        assert!(!StandardResidue::HOH.is_nucleic());
    }

    #[test]
    fn standard_residue_round_trips_through_code() {
        for code in ["ALA", "TRP", "DG", "U", "HOH"] {
            let residue = StandardResidue::from_str(code).unwrap();
            assert_eq!(residue.to_string(), code);
        }
        assert!(StandardResidue::from_str("XYZ").is_err());
    }

    #[test]
    fn residue_category_display_formats_correctly() {
        assert_eq!(ResidueCategory::Standard.to_string(), "Standard Residue");
        assert_eq!(ResidueCategory::Ion.to_string(), "Ion");
    }
}
