//! Atom classification for supervised surface labels.
//!
//! An [`AtomClassifier`] maps each atom of a reference entity to an integer class id. Class
//! ids are positions in the classifier's vocabulary: id `0` is always the default class
//! (atoms that match no rule), and ids `1..` follow the order in which classes are declared.
//!
//! Rules are tested in declaration order, class by class, and the first matching rule decides
//! the class. Residue and atom patterns are unanchored regular expressions matched against
//! the trimmed, upper-cased names; write `^...$` for exact matches.
//!
//! A classifier is an immutable value. Build it once per run and share it by reference.

mod error;

pub use error::Error;

use crate::db::{self, ClassSetFile};
use crate::model::{atom::Atom, residue::Residue};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Index into [`AtomClassifier::classes`].
pub type ClassId = usize;

/// Class id assigned to atoms matching no rule.
pub const DEFAULT_CLASS: ClassId = 0;

#[derive(Debug, Clone)]
struct Rule {
    class_id: ClassId,
    residue: Regex,
    atom: Option<Regex>,
}

impl Rule {
    fn matches(&self, residue_name: &str, atom_name: Option<&str>) -> bool {
        if !self.residue.is_match(residue_name) {
            return false;
        }
        match (&self.atom, atom_name) {
            (None, _) => true,
            (Some(pattern), Some(name)) => pattern.is_match(name),
            (Some(_), None) => false,
        }
    }
}

/// Ordered rule set assigning class ids to atoms.
#[derive(Debug, Clone)]
pub struct AtomClassifier {
    name: String,
    classes: Vec<String>,
    rules: Vec<Rule>,
}

impl AtomClassifier {
    /// Resolves a classifier argument.
    ///
    /// The argument is tried as a built-in class set name first, then as a path to a JSON
    /// class set when it ends in `.json`, and finally as a plain identifier list file.
    pub fn resolve(arg: &str) -> Result<Self, Error> {
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(Error::configuration(
                "no classifier given: expected a built-in class set, a JSON class set, or an identifier list",
            ));
        }

        if let Some(set) = db::builtin_class_set(arg) {
            return Self::from_class_set(set);
        }

        let path = Path::new(arg);
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_file(path)
        } else if path.is_file() {
            Self::from_list_file(path)
        } else {
            let known: Vec<&str> = db::builtin_class_set_names().collect();
            Err(Error::configuration(format!(
                "'{}' is neither a built-in class set ({}) nor a readable file",
                arg,
                known.join(", ")
            )))
        }
    }

    /// Builds one of the embedded class sets.
    pub fn builtin(name: &str) -> Result<Self, Error> {
        let set = db::builtin_class_set(name)
            .ok_or_else(|| Error::configuration(format!("unknown built-in class set '{}'", name)))?;
        Self::from_class_set(set)
    }

    /// Parses a JSON class set.
    ///
    /// ```json
    /// { "name": "PHOSPHATE", "default": "none",
    ///   "classes": [ { "name": "p", "rules": [ { "residue": "^D[ACGT]$", "atom": "^OP[12]$" } ] } ] }
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        let set: ClassSetFile = serde_json::from_str(text)
            .map_err(|e| Error::configuration(format!("malformed class set: {}", e)))?;
        Self::from_class_set(&set)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let set: ClassSetFile = serde_json::from_str(&text).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_class_set(&set)
    }

    /// Reads an identifier list: one residue name per line, `#` starts a comment.
    ///
    /// The classifier is named after the file stem and maps every listed residue to a single
    /// `ligand` class.
    pub fn from_list_file(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let identifiers = text
            .lines()
            .map(|line| line.split('#').next().unwrap_or("").trim())
            .filter(|line| !line.is_empty());
        Self::from_identifiers(&name, identifiers, "ligand")
    }

    /// Builds a two-class classifier from an explicit residue identifier allow-list.
    ///
    /// Listed residues map to `target_class`; everything else is the default class `none`.
    pub fn from_identifiers<I, S>(name: &str, identifiers: I, target_class: &str) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut escaped = Vec::new();
        for id in identifiers {
            let id = normalize(id.as_ref());
            if !id.is_empty() && seen.insert(id.clone()) {
                escaped.push(regex::escape(&id));
            }
        }
        if escaped.is_empty() {
            return Err(Error::configuration(format!(
                "identifier list for '{}' is empty",
                name
            )));
        }

        let set = ClassSetFile {
            name: name.to_string(),
            default: "none".to_string(),
            classes: vec![db::ClassEntry {
                name: target_class.to_string(),
                rules: vec![db::RuleEntry {
                    residue: format!("^(?:{})$", escaped.join("|")),
                    atom: None,
                }],
            }],
        };
        Self::from_class_set(&set)
    }

    pub(crate) fn from_class_set(set: &ClassSetFile) -> Result<Self, Error> {
        validate_name(&set.name)?;
        if set.classes.is_empty() {
            return Err(Error::configuration(format!(
                "class set '{}' declares no classes",
                set.name
            )));
        }

        let mut classes = vec![set.default.clone()];
        let mut rules = Vec::new();

        for entry in &set.classes {
            if classes.contains(&entry.name) {
                return Err(Error::configuration(format!(
                    "class '{}' is declared more than once in '{}'",
                    entry.name, set.name
                )));
            }
            if entry.rules.is_empty() {
                return Err(Error::configuration(format!(
                    "class '{}' in '{}' has no rules",
                    entry.name, set.name
                )));
            }
            let class_id = classes.len();
            classes.push(entry.name.clone());

            for rule in &entry.rules {
                let residue = Regex::new(&rule.residue)
                    .map_err(|e| Error::invalid_pattern(&entry.name, &rule.residue, e))?;
                let atom = rule
                    .atom
                    .as_deref()
                    .map(|p| Regex::new(p).map_err(|e| Error::invalid_pattern(&entry.name, p, e)))
                    .transpose()?;
                rules.push(Rule {
                    class_id,
                    residue,
                    atom,
                });
            }
        }

        Ok(Self {
            name: set.name.clone(),
            classes,
            rules,
        })
    }

    /// Name of the class set, used as the label key in bundles.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Class vocabulary; the position of a name is its class id.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Classifies an atom by its owning residue name and atom name.
    pub fn classify_names(&self, residue_name: &str, atom_name: &str) -> ClassId {
        let residue_name = normalize(residue_name);
        let atom_name = normalize(atom_name);
        self.rules
            .iter()
            .find(|rule| rule.matches(&residue_name, Some(&atom_name)))
            .map(|rule| rule.class_id)
            .unwrap_or(DEFAULT_CLASS)
    }

    pub fn classify(&self, residue: &Residue, atom: &Atom) -> ClassId {
        self.classify_names(&residue.name, &atom.name)
    }

    /// Reports whether any atom of the residue (or the residue name alone, for rules without
    /// an atom pattern) matches a non-default rule.
    pub fn test_residue(&self, residue: &Residue) -> bool {
        let residue_name = normalize(&residue.name);
        self.rules.iter().any(|rule| {
            rule.matches(&residue_name, None)
                || residue
                    .iter_atoms()
                    .any(|atom| rule.matches(&residue_name, Some(&normalize(&atom.name))))
        })
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_ascii_uppercase()
}

fn validate_name(name: &str) -> Result<(), Error> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(Error::configuration(format!(
            "class set name '{}' must be non-empty and use only letters, digits, '_', '-', '.'",
            name
        )))
    }
}
