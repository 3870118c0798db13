//! Resource materializer for the mirrored tree
//!
//! Writes rewritten pages and raw resource bytes to their assigned local
//! paths under the output root, creating intermediate directories on the
//! way. Each distinct local path is written at most once per run; a second
//! write to the same path is a silent no-op, which keeps the first
//! materialization stable when several URLs share one file.

use crate::{KagamiError, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub struct MirrorWriter {
    root: PathBuf,
    written: HashSet<String>,
}

impl MirrorWriter {
    /// Creates the output root. Failure here is fatal for the run.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|source| KagamiError::Write {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self {
            root: root.to_path_buf(),
            written: HashSet::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a page's rewritten markup. Returns false if the path was
    /// already written this run.
    pub fn write_page(&mut self, local_path: &str, markup: &str) -> Result<bool> {
        self.write_once(local_path, markup.as_bytes())
    }

    /// Writes a resource's raw bytes. Returns false if the path was already
    /// written this run.
    pub fn write_resource(&mut self, local_path: &str, bytes: &[u8]) -> Result<bool> {
        self.write_once(local_path, bytes)
    }

    pub fn written_len(&self) -> usize {
        self.written.len()
    }

    fn write_once(&mut self, local_path: &str, bytes: &[u8]) -> Result<bool> {
        if !self.written.insert(local_path.to_string()) {
            return Ok(false);
        }

        let full = self.root.join(local_path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|source| KagamiError::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }
        fs::write(&full, bytes).map_err(|source| KagamiError::Write {
            path: full.display().to_string(),
            source,
        })?;

        Ok(true)
    }
}
