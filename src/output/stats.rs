//! Run statistics and the end-of-run summary
//!
//! Every skip and failure is counted during the crawl and surfaced to the
//! user when the run finishes; nothing is dropped silently.

/// Counters accumulated over one mirroring run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Pages fetched, processed and persisted
    pub pages_downloaded: usize,

    /// Internal URLs skipped by the language filter
    pub pages_skipped_language: usize,

    /// Pages dropped on fetch failure or non-HTML content
    pub pages_failed: usize,

    /// Resources fetched and written into the mirror
    pub resources_downloaded: usize,

    /// Resources that could not be fetched or written
    pub resources_failed: usize,

    /// Images downloaded into the shared folder (markdown mode)
    pub images_downloaded: usize,

    /// Distinct URLs recorded in the manifest
    pub urls_discovered: usize,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total skip/failure events of the run
    pub fn total_failures(&self) -> usize {
        self.pages_failed + self.resources_failed
    }
}

/// Prints the end-of-run summary
pub fn print_summary(stats: &RunStats, english_only: bool, markdown: bool) {
    println!();
    println!("Download completed! Found {} URLs.", stats.urls_discovered);
    println!("Pages downloaded: {}", stats.pages_downloaded);
    if !markdown {
        println!("Resources downloaded: {}", stats.resources_downloaded);
    } else {
        println!("Images downloaded: {}", stats.images_downloaded);
    }
    if english_only {
        println!(
            "Non-English pages skipped: {}",
            stats.pages_skipped_language
        );
    }
    println!("Errors encountered: {}", stats.total_failures());
}
