//! URL handling module for Kagami
//!
//! This module provides URL normalization, same-site classification, and the
//! locale heuristic used by english-only mode.

mod locale;
mod normalize;

// Re-export main functions
pub use locale::is_non_primary_locale;
pub use normalize::normalize_url;

use url::Url;

/// File extensions treated as non-HTML resources when they appear on the
/// site's own host.
const RESOURCE_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "png", "jpg", "jpeg", "gif", "svg", "webp", "avif", "ico", "bmp", "woff",
    "woff2", "ttf", "otf", "eot", "pdf", "zip", "mp3", "mp4", "webm", "wasm", "json", "xml", "txt",
];

/// Classification of a discovered URL relative to the site being mirrored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlClass {
    /// Same host, HTML-like path: a page to crawl
    Internal,
    /// Same host, known asset extension: fetched once, never crawled
    Resource,
    /// Foreign host: recorded in the manifest, never fetched or enqueued
    External,
}

impl UrlClass {
    /// Returns true if the URL may be fetched at all
    pub fn is_fetchable(&self) -> bool {
        !matches!(self, Self::External)
    }

    /// Returns true if the URL is a page that can yield further links
    pub fn is_page(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Classifies a normalized URL against the site host.
///
/// A foreign host is always `External`, regardless of what the path looks
/// like; mirroring never leaves the entry page's domain. On the site host,
/// a path with a known asset extension is a `Resource` and everything else
/// is `Internal` (HTML-like).
pub fn classify(url: &Url, site_host: &str) -> UrlClass {
    match url.host_str() {
        Some(host) if host == site_host => {
            if has_resource_extension(url.path()) {
                UrlClass::Resource
            } else {
                UrlClass::Internal
            }
        }
        _ => UrlClass::External,
    }
}

/// Returns true if the path's final segment carries a known asset extension
pub fn has_resource_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            RESOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        }
        _ => false,
    }
}
