//! NPZ archive codec shared by bundles and adjacency artifacts.
//!
//! Archives are read fully into memory. Writes go to a temporary file next to the target,
//! which is synced and renamed over the target only once every array has been written.

use crate::io::Error;
use ndarray::{ArrayD, ArrayView1, IxDyn, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// A single array stored in an archive.
///
/// Text is stored as a one-dimensional `u8` array of UTF-8 bytes; lists of strings are joined
/// with newlines.
#[derive(Debug, Clone, PartialEq)]
pub enum BundleArray {
    F64(ArrayD<f64>),
    F32(ArrayD<f32>),
    I64(ArrayD<i64>),
    I32(ArrayD<i32>),
    Bool(ArrayD<bool>),
    Text(String),
    Bytes(ArrayD<u8>),
}

impl BundleArray {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn text_list<S: AsRef<str>>(values: &[S]) -> Self {
        Self::Text(
            values
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::F64(a) => a.shape().to_vec(),
            Self::F32(a) => a.shape().to_vec(),
            Self::I64(a) => a.shape().to_vec(),
            Self::I32(a) => a.shape().to_vec(),
            Self::Bool(a) => a.shape().to_vec(),
            Self::Text(s) => vec![s.len()],
            Self::Bytes(a) => a.shape().to_vec(),
        }
    }

    pub fn dtype(&self) -> &'static str {
        match self {
            Self::F64(_) => "f64",
            Self::F32(_) => "f32",
            Self::I64(_) => "i64",
            Self::I32(_) => "i32",
            Self::Bool(_) => "bool",
            Self::Text(_) => "text",
            Self::Bytes(_) => "u8",
        }
    }

    /// Number of leading-axis entries, or `None` for text.
    pub fn rows(&self) -> Option<usize> {
        match self {
            Self::Text(_) => None,
            _ => self.shape().first().copied(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Splits newline-joined text; empty text is an empty list.
    pub fn as_text_list(&self) -> Option<Vec<String>> {
        self.as_text().map(|s| {
            if s.is_empty() {
                Vec::new()
            } else {
                s.split('\n').map(str::to_string).collect()
            }
        })
    }
}

/// Reads every array of an NPZ archive.
pub fn read_archive(path: &Path) -> Result<BTreeMap<String, BundleArray>, Error> {
    let file = File::open(path).map_err(|e| Error::from_io(e, Some(path.to_path_buf())))?;
    let mut npz = NpzReader::new(BufReader::new(file))
        .map_err(|e| Error::npz(Some(path.to_path_buf()), e.to_string()))?;
    let names = npz
        .names()
        .map_err(|e| Error::npz(Some(path.to_path_buf()), e.to_string()))?;

    let mut arrays = BTreeMap::new();
    for name in names {
        let array = read_entry(&mut npz, &name).ok_or_else(|| {
            Error::npz(
                Some(path.to_path_buf()),
                format!("array '{}' is unreadable or has an unsupported dtype", name),
            )
        })?;
        arrays.insert(name, array);
    }
    Ok(arrays)
}

fn read_entry<R: Read + Seek>(npz: &mut NpzReader<R>, name: &str) -> Option<BundleArray> {
    if let Ok(a) = npz.by_name::<OwnedRepr<f64>, IxDyn>(name) {
        return Some(BundleArray::F64(a));
    }
    if let Ok(a) = npz.by_name::<OwnedRepr<i64>, IxDyn>(name) {
        return Some(BundleArray::I64(a));
    }
    if let Ok(a) = npz.by_name::<OwnedRepr<u8>, IxDyn>(name) {
        let bytes: Vec<u8> = a.iter().copied().collect();
        return Some(match String::from_utf8(bytes) {
            Ok(text) if a.ndim() == 1 => BundleArray::Text(text),
            _ => BundleArray::Bytes(a),
        });
    }
    if let Ok(a) = npz.by_name::<OwnedRepr<f32>, IxDyn>(name) {
        return Some(BundleArray::F32(a));
    }
    if let Ok(a) = npz.by_name::<OwnedRepr<i32>, IxDyn>(name) {
        return Some(BundleArray::I32(a));
    }
    if let Ok(a) = npz.by_name::<OwnedRepr<bool>, IxDyn>(name) {
        return Some(BundleArray::Bool(a));
    }
    None
}

/// Writes a compressed NPZ archive atomically.
pub fn write_archive(path: &Path, arrays: &BTreeMap<String, BundleArray>) -> Result<(), Error> {
    let io_err = |e: std::io::Error| Error::from_io(e, Some(path.to_path_buf()));
    let npz_err = |e: ndarray_npy::WriteNpzError| Error::npz(Some(path.to_path_buf()), e.to_string());

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(io_err)?;

    {
        let mut npz = NpzWriter::new_compressed(BufWriter::new(temp.as_file_mut()));
        for (name, array) in arrays {
            let name = name.as_str();
            match array {
                BundleArray::F64(a) => npz.add_array(name, a),
                BundleArray::F32(a) => npz.add_array(name, a),
                BundleArray::I64(a) => npz.add_array(name, a),
                BundleArray::I32(a) => npz.add_array(name, a),
                BundleArray::Bool(a) => npz.add_array(name, a),
                BundleArray::Text(s) => npz.add_array(name, &ArrayView1::from(s.as_bytes())),
                BundleArray::Bytes(a) => npz.add_array(name, a),
            }
            .map_err(npz_err)?;
        }
        let mut writer = npz.finish().map_err(npz_err)?;
        writer.flush().map_err(io_err)?;
    }

    temp.as_file().sync_all().map_err(io_err)?;
    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn archive_preserves_every_supported_dtype() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mixed.npz");

        let mut arrays = BTreeMap::new();
        arrays.insert("a".to_string(), BundleArray::F64(array![[1.5, -2.0], [0.0, 3.25]].into_dyn()));
        arrays.insert("b".to_string(), BundleArray::F32(array![1.0f32, 2.0].into_dyn()));
        arrays.insert("c".to_string(), BundleArray::I64(array![-1i64, 0, 7].into_dyn()));
        arrays.insert("d".to_string(), BundleArray::I32(array![[4i32]].into_dyn()));
        arrays.insert("e".to_string(), BundleArray::Bool(array![true, false].into_dyn()));
        arrays.insert("f".to_string(), BundleArray::text_list(&["cv_fine", "pot"]));

        write_archive(&path, &arrays).unwrap();
        let read = read_archive(&path).unwrap();

        assert_eq!(read, arrays);
        assert_eq!(read["f"].as_text_list().unwrap(), vec!["cv_fine", "pot"]);
    }

    #[test]
    fn write_replaces_existing_file_and_leaves_no_residue() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bundle.npz");
        std::fs::write(&path, b"stale").unwrap();

        let mut arrays = BTreeMap::new();
        arrays.insert("name".to_string(), BundleArray::text("1abc_protein"));
        write_archive(&path, &arrays).unwrap();

        assert_eq!(read_archive(&path).unwrap(), arrays);
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn garbage_is_reported_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.npz");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = read_archive(&path).unwrap_err();
        assert!(matches!(err, Error::Npz { path: Some(ref p), .. } if p == &path));
    }

    #[test]
    fn empty_text_list_round_trips() {
        let list = BundleArray::text_list::<&str>(&[]);
        assert_eq!(list.as_text_list().unwrap(), Vec::<String>::new());
    }
}
