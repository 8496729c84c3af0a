use super::loader;
use super::schema::{BackboneSites, ClassSetFile, ResidueProperties};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct InternalResidue {
    pub props: ResidueProperties,
    pub donors: HashSet<String>,
    pub acceptors: HashSet<String>,
}

impl InternalResidue {
    pub fn new(props: ResidueProperties, backbone: &BackboneSites) -> Self {
        let mut donors: HashSet<String> = props.donors.iter().cloned().collect();
        if props.backbone_donor {
            donors.extend(backbone.donors.iter().cloned());
        }
        let mut acceptors: HashSet<String> = props.acceptors.iter().cloned().collect();
        acceptors.extend(backbone.acceptors.iter().cloned());

        Self {
            props,
            donors,
            acceptors,
        }
    }
}

pub struct DataStore {
    pub residues_by_name: HashMap<String, InternalResidue>,
    pub class_sets: BTreeMap<String, ClassSetFile>,
}

static STORE: OnceLock<DataStore> = OnceLock::new();

pub fn get_store() -> &'static DataStore {
    STORE.get_or_init(loader::load_all)
}
