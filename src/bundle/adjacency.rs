//! Vertex adjacency stored as a sparse COO matrix.
//!
//! The artifact holds `row`, `col` (i64), `data` (f64, all ones), `shape` (i64, 2), and a
//! `format` text entry set to `coo`. Every undirected edge appears in both directions, sorted
//! by row and then column.

use super::archive::{BundleArray, read_archive, write_archive};
use super::error::Error;
use crate::mesh::Mesh;
use ndarray::{Array1, ArrayD};
use std::collections::BTreeMap;
use std::path::Path;

const FORMAT: &str = "coo";

/// Writes the vertex adjacency of `mesh` to `path`.
pub fn save_adjacency(path: &Path, mesh: &Mesh) -> Result<(), Error> {
    let mut row = Vec::new();
    let mut col = Vec::new();
    for (i, ring) in mesh.adjacency().iter().enumerate() {
        for &j in ring {
            row.push(i as i64);
            col.push(j as i64);
        }
    }
    let n = mesh.num_vertices() as i64;
    let nnz = row.len();

    let mut arrays = BTreeMap::new();
    arrays.insert("row".to_string(), BundleArray::I64(Array1::from(row).into_dyn()));
    arrays.insert("col".to_string(), BundleArray::I64(Array1::from(col).into_dyn()));
    arrays.insert("data".to_string(), BundleArray::F64(Array1::from_elem(nnz, 1.0).into_dyn()));
    arrays.insert("shape".to_string(), BundleArray::I64(Array1::from(vec![n, n]).into_dyn()));
    arrays.insert("format".to_string(), BundleArray::text(FORMAT));

    write_archive(path, &arrays)?;
    log::debug!("wrote {} adjacency entries to {}", nnz, path.display());
    Ok(())
}

/// Reads an adjacency artifact back into sorted neighbour lists.
pub fn load_adjacency(path: &Path) -> Result<Vec<Vec<usize>>, Error> {
    let arrays = read_archive(path)?;
    let bundle = path.display().to_string();

    let format = arrays
        .get("format")
        .and_then(BundleArray::as_text)
        .ok_or_else(|| Error::missing_array(&bundle, "format"))?;
    if format != FORMAT {
        return Err(Error::TypeMismatch {
            bundle,
            name: "format".to_string(),
            expected: FORMAT,
            found: "another sparse format",
        });
    }

    let shape = int_vector(&arrays, &bundle, "shape")?;
    let row = int_vector(&arrays, &bundle, "row")?;
    let col = int_vector(&arrays, &bundle, "col")?;
    let n = match shape.as_slice() {
        [r, c] if r == c && *r >= 0 => *r as usize,
        _ => return Err(Error::shape_mismatch(&bundle, "shape", "[n, n]", &[shape.len()])),
    };
    if row.len() != col.len() {
        return Err(Error::shape_mismatch(
            &bundle,
            "col",
            format!("[{}]", row.len()),
            &[col.len()],
        ));
    }

    let mut lists = vec![Vec::new(); n];
    for (&i, &j) in row.iter().zip(&col) {
        let (Ok(i), Ok(j)) = (usize::try_from(i), usize::try_from(j)) else {
            return Err(Error::shape_mismatch(&bundle, "row", format!("indices in 0..{n}"), &[]));
        };
        if i >= n || j >= n {
            return Err(Error::shape_mismatch(&bundle, "row", format!("indices in 0..{n}"), &[i.max(j)]));
        }
        lists[i].push(j);
    }
    for list in &mut lists {
        list.sort_unstable();
        list.dedup();
    }
    Ok(lists)
}

fn int_vector(
    arrays: &BTreeMap<String, BundleArray>,
    bundle: &str,
    name: &str,
) -> Result<Vec<i64>, Error> {
    match arrays.get(name) {
        Some(BundleArray::I64(a)) => Ok(flatten(a)),
        Some(BundleArray::I32(a)) => Ok(a.iter().map(|&v| v as i64).collect()),
        Some(other) => Err(Error::TypeMismatch {
            bundle: bundle.to_string(),
            name: name.to_string(),
            expected: "i64",
            found: other.dtype(),
        }),
        None => Err(Error::missing_array(bundle, name)),
    }
}

fn flatten(a: &ArrayD<i64>) -> Vec<i64> {
    a.iter().copied().collect()
}
