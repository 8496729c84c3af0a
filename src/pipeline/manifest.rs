use super::error::Error;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Line-oriented record of the bundles produced by a run.
///
/// Every entry is flushed as soon as it is recorded, so the file lists exactly the structures
/// that completed even if the run is interrupted.
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: usize,
}

impl Manifest {
    /// Creates or truncates the manifest file.
    pub fn create(path: &Path) -> Result<Self, Error> {
        let file = File::create(path).map_err(|source| Error::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            entries: 0,
        })
    }

    pub fn record(&mut self, entry: &str) -> Result<(), Error> {
        writeln!(self.writer, "{}", entry)
            .and_then(|_| self.writer.flush())
            .map_err(|source| Error::Manifest {
                path: self.path.clone(),
                source,
            })?;
        self.entries += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

/// Reads a structure list, one file name per line.
///
/// Surrounding whitespace is trimmed; blank lines and lines starting with `#` are skipped.
pub fn read_structure_list(path: &Path) -> Result<Vec<String>, Error> {
    let file = File::open(path)
        .map_err(|e| crate::io::Error::from_io(e, Some(path.to_path_buf())))?;
    let mut entries = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| crate::io::Error::from_io(e, Some(path.to_path_buf())))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        entries.push(line.to_string());
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_visible_before_the_manifest_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed_files.dat");

        let mut manifest = Manifest::create(&path).unwrap();
        manifest.record("1abc_protein_data.npz").unwrap();
        manifest.record("2xyz_protein_data.npz").unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "1abc_protein_data.npz\n2xyz_protein_data.npz\n"
        );
    }

    #[test]
    fn structure_list_skips_comments_and_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, "# training set\n1abc.pdb\n\n  2xyz.pdb  \n#3bad.pdb\n").unwrap();

        assert_eq!(read_structure_list(&path).unwrap(), vec!["1abc.pdb", "2xyz.pdb"]);
    }

    #[test]
    fn unwritable_manifest_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::create(&dir.path().join("missing").join("out.dat")).unwrap_err();

        assert!(err.is_fatal_for_run());
    }
}
