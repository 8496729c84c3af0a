use super::schema::{ClassSetFile, ResiduePropertyFile};
use super::store::{DataStore, InternalResidue};
use std::collections::{BTreeMap, HashMap};

pub fn load_all() -> DataStore {
    let content = include_str!("../../data/residues.toml");
    let file: ResiduePropertyFile = toml::from_str(content)
        .unwrap_or_else(|e| panic!("Failed to parse residue property table: {}", e));

    let mut residues_by_name = HashMap::new();
    for props in file.residues {
        let name = props.name.clone();
        let internal = InternalResidue::new(props, &file.backbone);
        if residues_by_name.insert(name.clone(), internal).is_some() {
            panic!("Duplicate residue entry found: {}", name);
        }
    }

    let mut class_sets = BTreeMap::new();

    macro_rules! load_class_set {
        ($path:literal) => {
            let content = include_str!(concat!("../../data/classifiers/", $path));
            let set: ClassSetFile = toml::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse class set '{}': {}", $path, e));

            let set_name = set.name.clone();
            if class_sets.insert(set_name.clone(), set).is_some() {
                panic!("Duplicate class set name found: {}", set_name);
            }
        };
    }

    load_class_set!("BINARY_STANDARD_DNA.toml");
    load_class_set!("MULTICLASS_STANDARD_DSDNA.toml");
    load_class_set!("MULTICLASS_STANDARD_SSDNA.toml");

    DataStore {
        residues_by_name,
        class_sets,
    }
}
