mod context;
mod dx;
mod error;
mod off;
mod pdb;
mod xyzr;

pub use pdb::reader::read as read_pdb_structure;
pub use pdb::writer::write_structure as write_pdb_structure;

pub use off::{OffData, read as read_off_mesh, write as write_off_mesh};

pub use dx::{ScalarGrid, read as read_dx_grid};

pub use xyzr::write as write_xyzr;

pub use context::IoContext;

pub use error::Error;
