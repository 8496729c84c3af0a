use crate::io::error::Error;
use crate::model::{atom::Atom, residue::Residue, structure::Structure, types::ResidueCategory};
use std::io::Write;

/// Writes a structure as PDB ATOM/HETATM records with TER cards after each polymer chain.
///
/// Serial numbers restart at 1 and follow `Structure::iter_atoms` order, which is what the
/// external tools rely on when their per-atom output is matched back to the structure.
pub fn write_structure<W: Write>(writer: W, structure: &Structure) -> Result<(), Error> {
    let mut ctx = WriterContext::new(writer);
    ctx.write_atoms(structure)?;
    ctx.write_end()
}

struct WriterContext<W> {
    writer: W,
    current_serial: usize,
}

impl<W: Write> WriterContext<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            current_serial: 1,
        }
    }

    fn write_atoms(&mut self, structure: &Structure) -> Result<(), Error> {
        for chain in structure.iter_chains() {
            for residue in chain.iter_residues() {
                let record_type = if residue.is_protein() || residue.is_nucleic() {
                    "ATOM  "
                } else {
                    "HETATM"
                };

                for atom in residue.iter_atoms() {
                    let serial = self.current_serial;
                    self.write_atom_record(record_type, serial, atom, residue, &chain.id)?;
                    self.current_serial += 1;
                }
            }

            if let Some(last_standard) = chain
                .iter_residues()
                .rev()
                .find(|res| res.category == ResidueCategory::Standard && !res.is_water())
            {
                let serial = self.current_serial;
                self.write_ter_record(serial, last_standard, &chain.id)?;
                self.current_serial += 1;
            }
        }
        Ok(())
    }

    fn write_atom_record(
        &mut self,
        record_type: &str,
        serial: usize,
        atom: &Atom,
        residue: &Residue,
        chain_id: &str,
    ) -> Result<(), Error> {
        let symbol = atom.element.symbol();
        let atom_name = if atom.name.len() >= 4 || symbol.len() == 2 {
            format!("{:<4}", truncate(&atom.name, 4))
        } else {
            format!(" {:<3}", atom.name)
        };

        writeln!(
            self.writer,
            "{:6}{:5} {:4} {:>3} {:1}{:4}{:1}   {:8.3}{:8.3}{:8.3}{:6.2}{:6.2}          {:>2}",
            record_type,
            serial % 100000,
            atom_name,
            truncate(&residue.name, 3),
            chain_id.chars().next().unwrap_or(' '),
            residue.id % 10000,
            residue.insertion_code.unwrap_or(' '),
            atom.pos.x,
            atom.pos.y,
            atom.pos.z,
            1.00,
            0.00,
            symbol.to_uppercase()
        )
        .map_err(|e| Error::from_io(e, None))
    }

    fn write_ter_record(
        &mut self,
        serial: usize,
        residue: &Residue,
        chain_id: &str,
    ) -> Result<(), Error> {
        writeln!(
            self.writer,
            "TER   {:5}      {:>3} {:1}{:4}{:1}",
            serial % 100000,
            truncate(&residue.name, 3),
            chain_id.chars().next().unwrap_or(' '),
            residue.id % 10000,
            residue.insertion_code.unwrap_or(' ')
        )
        .map_err(|e| Error::from_io(e, None))
    }

    fn write_end(&mut self) -> Result<(), Error> {
        writeln!(self.writer, "END").map_err(|e| Error::from_io(e, None))?;
        self.writer.flush().map_err(|e| Error::from_io(e, None))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
