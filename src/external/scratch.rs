use super::error::Error;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A per-structure temporary directory, removed when dropped.
///
/// Every intermediate file handed to or produced by external tools for one structure lives
/// here, so an early return or a panic unwinding through the processing of that structure
/// leaves nothing behind.
#[derive(Debug)]
pub struct Scratch {
    id: String,
    dir: TempDir,
}

impl Scratch {
    pub fn new(id: &str) -> Result<Self, Error> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("surfforge-{}-", id))
            .tempdir()
            .map_err(|source| Error::Scratch { source })?;
        Ok(Self {
            id: id.to_string(),
            dir,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Path of `<id><suffix>` inside the directory.
    pub fn file(&self, suffix: &str) -> PathBuf {
        self.dir.path().join(format!("{}{}", self.id, suffix))
    }
}
