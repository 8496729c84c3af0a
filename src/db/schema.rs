use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ResiduePropertyFile {
    pub backbone: BackboneSites,
    #[serde(rename = "residue")]
    pub residues: Vec<ResidueProperties>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct BackboneSites {
    pub donors: Vec<String>,
    pub acceptors: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ResidueProperties {
    pub name: String,
    pub hydrophobicity: f64,
    pub max_sasa: f64,
    pub atchley: [f64; 5],
    #[serde(default)]
    pub donors: Vec<String>,
    #[serde(default)]
    pub acceptors: Vec<String>,
    #[serde(default = "default_true")]
    pub backbone_donor: bool,
}

/// Serialized form of an atom class set.
///
/// The same layout is used for the embedded built-in sets (TOML) and for user-supplied
/// class sets (JSON).
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClassSetFile {
    pub name: String,
    #[serde(default = "default_class_name")]
    pub default: String,
    pub classes: Vec<ClassEntry>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ClassEntry {
    pub name: String,
    pub rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RuleEntry {
    pub residue: String,
    #[serde(default)]
    pub atom: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_class_name() -> String {
    "none".to_string()
}
