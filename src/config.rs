//! Run options and entry-URL handling
//!
//! Everything the command surface feeds into a run lives here: the entry URL
//! (after lenient cleanup), the output directory, the inter-request delay,
//! and the mode flags. Output-directory derivation from the entry URL is a
//! pure function so it can be tested without touching the filesystem.

use crate::url::normalize_url;
use crate::{ConfigError, ConfigResult};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Options for a single mirroring run
#[derive(Debug, Clone)]
pub struct Options {
    /// Normalized entry URL; its host defines the site being mirrored
    pub entry: Url,

    /// Root directory the mirror (or markdown document) is written under
    pub output_dir: PathBuf,

    /// Mandatory pause after each completed request to the origin
    pub delay: Duration,

    /// Skip URLs that look like non-English page variants
    pub english_only: bool,

    /// Produce a single markdown document instead of a mirrored tree
    pub markdown: bool,

    /// Process only the entry page and its direct resources
    pub page_only: bool,
}

impl Options {
    /// Builds and validates run options from raw command-line values.
    ///
    /// The entry URL is cleaned up leniently (see [`sanitize_entry_url`]);
    /// the output directory defaults to the site host when not given; a
    /// negative delay is a configuration error.
    pub fn new(
        raw_url: &str,
        output: Option<PathBuf>,
        delay_secs: f64,
        english_only: bool,
        markdown: bool,
        page_only: bool,
    ) -> ConfigResult<Self> {
        let entry = sanitize_entry_url(raw_url)?;

        if !delay_secs.is_finite() || delay_secs < 0.0 {
            return Err(ConfigError::InvalidDelay(format!(
                "{} (must be a non-negative number of seconds)",
                delay_secs
            )));
        }

        let output_dir = output.unwrap_or_else(|| default_output_dir(&entry));

        Ok(Self {
            entry,
            output_dir,
            delay: Duration::from_secs_f64(delay_secs),
            english_only,
            markdown,
            page_only,
        })
    }

    /// The host of the site being mirrored (lowercased by normalization)
    pub fn site_host(&self) -> &str {
        self.entry.host_str().unwrap_or_default()
    }
}

/// Cleans up a user-supplied entry URL and normalizes it.
///
/// Tolerated input quirks, matching the tool's documented lenience:
/// a leading `@` (paste artifact) is stripped, and a missing scheme
/// defaults to `https://`.
pub fn sanitize_entry_url(raw: &str) -> ConfigResult<Url> {
    let trimmed = raw.trim().trim_start_matches('@');

    if trimmed.is_empty() {
        return Err(ConfigError::InvalidEntryUrl {
            url: raw.to_string(),
            reason: "empty URL".to_string(),
        });
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    normalize_url(&with_scheme, None).map_err(|e| ConfigError::InvalidEntryUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Derives the default output directory from the entry URL's host.
///
/// Pure function of the URL: `https://docs.example.com/guide` maps to
/// `docs.example.com`.
pub fn default_output_dir(entry: &Url) -> PathBuf {
    PathBuf::from(entry.host_str().unwrap_or("site"))
}
