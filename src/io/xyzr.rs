use crate::io::error::Error;
use crate::model::structure::Structure;
use std::io::Write;

/// Writes one `x y z radius` line per atom, using van der Waals radii.
///
/// This is the sphere list consumed by surface triangulation programs.
pub fn write<W: Write>(mut writer: W, structure: &Structure) -> Result<(), Error> {
    for atom in structure.iter_atoms() {
        writeln!(
            writer,
            "{:.3} {:.3} {:.3} {:.2}",
            atom.pos.x,
            atom.pos.y,
            atom.pos.z,
            atom.element.vdw_radius()
        )
        .map_err(|e| Error::from_io(e, None))?;
    }
    writer.flush().map_err(|e| Error::from_io(e, None))
}
