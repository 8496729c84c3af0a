use super::atom::Atom;
use super::chain::Chain;
use super::residue::Residue;
use super::types::Point;
use std::collections::HashSet;
use std::fmt;

/// Chain/residue/atom hierarchy loaded from a structure file.
///
/// Atom order is fixed at load time: [`Structure::iter_atoms`] always yields atoms chain by
/// chain, residue by residue, and every per-atom table in the crate is indexed in that order.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    pub name: String,
    chains: Vec<Chain>,
}

impl Structure {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            chains: Vec::new(),
        }
    }

    pub fn add_chain(&mut self, chain: Chain) {
        debug_assert!(
            self.chain(&chain.id).is_none(),
            "Attempted to add a duplicate chain ID '{}'",
            chain.id
        );
        self.chains.push(chain);
    }

    pub fn chain(&self, id: &str) -> Option<&Chain> {
        self.chains.iter().find(|c| c.id == id)
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn residue_count(&self) -> usize {
        self.chains.iter().map(|c| c.residue_count()).sum()
    }

    pub fn atom_count(&self) -> usize {
        self.chains.iter().map(|c| c.iter_atoms().count()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn iter_chains(&self) -> std::slice::Iter<'_, Chain> {
        self.chains.iter()
    }

    pub fn iter_atoms(&self) -> impl Iterator<Item = &Atom> {
        self.chains.iter().flat_map(|c| c.iter_atoms())
    }

    pub fn iter_atoms_with_context(&self) -> impl Iterator<Item = (&Chain, &Residue, &Atom)> {
        self.chains.iter().flat_map(|chain| {
            chain.iter_residues().flat_map(move |residue| {
                residue.iter_atoms().map(move |atom| (chain, residue, atom))
            })
        })
    }

    /// Returns the atom positions in canonical atom order.
    pub fn positions(&self) -> Vec<Point> {
        self.iter_atoms().map(|a| a.pos).collect()
    }

    /// Filters residues across all chains, then drops chains left without residues.
    pub fn retain_residues<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &mut Residue) -> bool,
    {
        for chain in &mut self.chains {
            let chain_id = chain.id.clone();
            chain.retain_residues(|residue| keep(&chain_id, residue));
        }
        self.prune_empty_chains();
    }

    pub fn prune_empty_chains(&mut self) {
        self.chains.retain(|c| !c.is_empty());
    }

    /// Builds a sub-structure made of the chains whose identifiers appear in `chain_ids`.
    ///
    /// Chains keep their original relative order, so atom order inside the slice is a
    /// subsequence of the parent's atom order.
    pub fn slice(&self, chain_ids: &HashSet<String>, name: &str) -> Structure {
        Structure {
            name: name.to_string(),
            chains: self
                .chains
                .iter()
                .filter(|c| chain_ids.contains(&c.id))
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Structure {{ name: \"{}\", chains: {}, residues: {}, atoms: {} }}",
            self.name,
            self.chain_count(),
            self.residue_count(),
            self.atom_count()
        )
    }
}
