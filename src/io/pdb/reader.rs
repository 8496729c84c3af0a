use crate::io::context::IoContext;
use crate::io::error::Error;
use crate::model::{
    atom::Atom,
    chain::Chain,
    residue::Residue,
    structure::Structure,
    types::{Element, Point, ResidueCategory},
};
use std::collections::HashMap;
use std::io::BufRead;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResKey {
    res_seq: i32,
    i_code: Option<char>,
}

struct TempResidue {
    key: ResKey,
    raw_name: String,
    is_hetatm: bool,
    atoms: Vec<(f64, Atom)>,
}

#[derive(Default)]
struct TempChain {
    residues: Vec<TempResidue>,
    index: HashMap<ResKey, usize>,
}

/// Reads the first model of a PDB stream.
///
/// Chains, residues, and atoms keep the order in which they first appear in the file. When
/// an atom carries alternate locations, the highest-occupancy record wins and keeps the slot
/// of the first record seen. Residue names are canonicalised through `context`; residues
/// that do not resolve to a standard residue are categorised as ions (single atom) or hetero
/// groups regardless of their record type.
pub fn read<R: BufRead>(reader: R, context: &IoContext) -> Result<Structure, Error> {
    let mut chain_order: Vec<String> = Vec::new();
    let mut chain_map: HashMap<String, TempChain> = HashMap::new();

    for (idx, line) in reader.lines().enumerate() {
        let line_num = idx + 1;
        let line = line.map_err(|e| Error::from_io(e, None))?;

        if line.starts_with("ENDMDL") {
            break;
        }

        let is_atom = line.starts_with("ATOM  ");
        let is_hetatm = line.starts_with("HETATM");

        if is_atom || is_hetatm {
            parse_atom_record(&line, line_num, is_hetatm, &mut chain_order, &mut chain_map)?;
        }
    }

    let mut structure = Structure::new("");

    for chain_id in chain_order {
        let Some(temp_chain) = chain_map.remove(&chain_id) else {
            continue;
        };
        let mut chain = Chain::new(&chain_id);

        for temp_res in temp_chain.residues {
            let (canonical_name, std_enum) = context.classify_residue(&temp_res.raw_name);

            let category = if std_enum.is_some() {
                ResidueCategory::Standard
            } else if temp_res.atoms.len() == 1 {
                ResidueCategory::Ion
            } else {
                ResidueCategory::Hetero
            };

            if std_enum.is_none() && !temp_res.is_hetatm {
                log::debug!(
                    "non-standard residue '{}' in ATOM records of chain {}",
                    temp_res.raw_name,
                    chain_id
                );
            }

            let mut residue = Residue::new(
                temp_res.key.res_seq,
                temp_res.key.i_code,
                &canonical_name,
                std_enum,
                category,
            );
            for (_, atom) in temp_res.atoms {
                residue.add_atom(atom);
            }
            chain.add_residue(residue);
        }

        structure.add_chain(chain);
    }

    Ok(structure)
}

fn field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("")
}

fn column(line: &str, idx: usize) -> Option<char> {
    line.get(idx..idx + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| *c != ' ')
}

fn parse_coord(line: &str, start: usize, axis: &str, line_num: usize) -> Result<f64, Error> {
    field(line, start, start + 8)
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::parse("PDB", None, line_num, format!("Invalid {} coordinate", axis)))
}

fn parse_atom_record(
    line: &str,
    line_num: usize,
    is_hetatm: bool,
    chain_order: &mut Vec<String>,
    chain_map: &mut HashMap<String, TempChain>,
) -> Result<(), Error> {
    if line.len() < 54 {
        return Err(Error::parse("PDB", None, line_num, "Atom record too short"));
    }

    let raw_atom_name = field(line, 12, 16);
    let atom_name = raw_atom_name.trim().to_string();
    let res_name = field(line, 17, 20).trim().to_string();
    let chain_id = column(line, 21).map(String::from).unwrap_or_default();
    let i_code = column(line, 26);

    if atom_name.is_empty() {
        return Err(Error::parse("PDB", None, line_num, "Missing atom name"));
    }

    let res_seq = field(line, 22, 26)
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::parse("PDB", None, line_num, "Invalid residue sequence number"))?;

    let pos = Point::new(
        parse_coord(line, 30, "X", line_num)?,
        parse_coord(line, 38, "Y", line_num)?,
        parse_coord(line, 46, "Z", line_num)?,
    );

    let occupancy = field(line, 54, 60).trim().parse::<f64>().unwrap_or(1.0);

    let element_str = field(line, 76, 78).trim();
    let element = if element_str.is_empty() {
        parse_element_from_name(raw_atom_name)
    } else {
        Element::from_str(element_str).unwrap_or_else(|_| parse_element_from_name(raw_atom_name))
    };

    if !chain_map.contains_key(&chain_id) {
        chain_order.push(chain_id.clone());
    }
    let chain = chain_map.entry(chain_id).or_default();

    let key = ResKey { res_seq, i_code };
    let slot = match chain.index.get(&key) {
        Some(&slot) => slot,
        None => {
            chain.residues.push(TempResidue {
                key: key.clone(),
                raw_name: res_name,
                is_hetatm,
                atoms: Vec::new(),
            });
            chain.index.insert(key, chain.residues.len() - 1);
            chain.residues.len() - 1
        }
    };
    let temp_res = &mut chain.residues[slot];

    let atom = Atom::new(&atom_name, element, pos);
    match temp_res.atoms.iter_mut().find(|(_, a)| a.name == atom_name) {
        Some(existing) => {
            if occupancy > existing.0 {
                *existing = (occupancy, atom);
            }
        }
        None => temp_res.atoms.push((occupancy, atom)),
    }

    Ok(())
}

/// Infers an element from the raw four-column atom name field.
///
/// Names of one-letter elements start in the second column (" CA " is carbon), while
/// two-letter elements fill the first column ("CA  " is calcium). Leading digits mark
/// hydrogen naming schemes such as "1HB ". Four-letter names starting with H ("HG21") are
/// hydrogens, not mercury.
fn parse_element_from_name(raw: &str) -> Element {
    let first = raw.chars().next().unwrap_or(' ');
    let hydrogen_like = first == 'H' && raw.trim().len() > 2;

    if first.is_ascii_alphabetic() && !hydrogen_like {
        let pair: String = raw.chars().take(2).filter(|c| c.is_ascii_alphabetic()).collect();
        if pair.len() == 2 {
            if let Ok(el) = Element::from_str(&pair) {
                return el;
            }
        }
    }

    raw.chars()
        .find(|c| c.is_ascii_alphabetic())
        .and_then(|c| Element::from_str(&c.to_string()).ok())
        .unwrap_or(Element::Unknown)
}
