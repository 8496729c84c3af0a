//! Partitioning of a complex into the protein receptor and its binding partners.

use crate::model::chain::Chain;
use crate::model::residue::Residue;
use crate::model::structure::Structure;
use std::collections::HashSet;

/// Polymer type assigned to a whole chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKind {
    Protein,
    Nucleic,
}

/// Sub-structures of a complex.
#[derive(Debug, Clone)]
pub struct Entities {
    /// Whole protein chains.
    pub protein: Structure,
    /// Whole nucleic-acid chains plus every residue of the protein chains that is not an
    /// amino acid (ligands, ions, waters), in complex order.
    pub partners: Structure,
}

/// Types a chain by majority vote between standard amino acids and standard nucleotides.
///
/// Ties, including chains with neither (waters, ligands), count as protein so the receptor
/// side keeps everything that is not clearly nucleic acid.
pub fn chain_kind(chain: &Chain) -> ChainKind {
    let (protein, nucleic) = chain
        .iter_residues()
        .fold((0usize, 0usize), |(p, n), residue| {
            (
                p + residue.is_protein() as usize,
                n + residue.is_nucleic() as usize,
            )
        });

    if nucleic > protein {
        ChainKind::Nucleic
    } else {
        ChainKind::Protein
    }
}

/// Splits a structure into its protein chains and the partners they bind.
///
/// The sub-structures are named `<name>_protein` and `<name>_partners`. Protein chains
/// contribute only their non-amino-acid residues to the partners, so a receptor cannot label
/// its own surface.
pub fn split_entities(structure: &Structure) -> Entities {
    let mut protein_ids = HashSet::new();
    let mut nucleic_ids = HashSet::new();

    for chain in structure.iter_chains() {
        match chain_kind(chain) {
            ChainKind::Protein => protein_ids.insert(chain.id.clone()),
            ChainKind::Nucleic => nucleic_ids.insert(chain.id.clone()),
        };
    }

    let mut partners = structure.clone();
    partners.name = format!("{}_partners", structure.name);
    partners.retain_residues(|chain_id, residue| nucleic_ids.contains(chain_id) || !residue.is_protein());

    Entities {
        protein: structure.slice(&protein_ids, &format!("{}_protein", structure.name)),
        partners,
    }
}

/// Copies the residues accepted by `keep` into a new structure called `name`.
///
/// Chains left without residues are dropped; the relative order of everything kept is preserved.
pub fn select_residues<F>(structure: &Structure, name: &str, mut keep: F) -> Structure
where
    F: FnMut(&Residue) -> bool,
{
    let mut selected = structure.clone();
    selected.name = name.to_string();
    selected.retain_residues(|_chain_id, residue| keep(residue));
    selected
}
