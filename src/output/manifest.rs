//! Discovered-URL manifest
//!
//! Every normalized URL the crawl discovers — Internal, Resource, and
//! External alike — is appended to `all_urls.txt`, one per line, in
//! first-discovery order. Each line is flushed as it is written so an
//! interrupted run still leaves a truthful prefix on disk.

use crate::{KagamiError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use url::Url;

/// Default manifest file name, a sibling of the mirrored content
pub const MANIFEST_FILE: &str = "all_urls.txt";

pub struct ManifestWriter {
    file: File,
    seen: HashSet<String>,
}

impl ManifestWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|source| KagamiError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            file,
            seen: HashSet::new(),
        })
    }

    /// Records a URL once. Returns true the first time a URL is seen.
    pub fn record(&mut self, url: &Url) -> Result<bool> {
        if !self.seen.insert(url.as_str().to_string()) {
            return Ok(false);
        }
        writeln!(self.file, "{}", url)?;
        self.file.flush()?;
        Ok(true)
    }

    /// Number of distinct URLs recorded so far
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_records_in_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let mut manifest = ManifestWriter::create(&path).unwrap();

        manifest.record(&url("https://example.com/")).unwrap();
        manifest.record(&url("https://example.com/b")).unwrap();
        manifest.record(&url("https://other.com/x")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "https://example.com/",
                "https://example.com/b",
                "https://other.com/x"
            ]
        );
    }

    #[test]
    fn test_each_url_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let mut manifest = ManifestWriter::create(&path).unwrap();

        assert!(manifest.record(&url("https://example.com/a")).unwrap());
        assert!(!manifest.record(&url("https://example.com/a")).unwrap());
        assert_eq!(manifest.len(), 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_lines_flushed_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MANIFEST_FILE);
        let mut manifest = ManifestWriter::create(&path).unwrap();

        manifest.record(&url("https://example.com/early")).unwrap();

        // readable before the writer is dropped
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "https://example.com/early\n");
    }
}
