//! Path mapping and link rewriting
//!
//! The [`PathMap`] assigns every discovered URL a stable local path under
//! the output root; the rewriter substitutes each intra-site reference in a
//! page's markup with the relative path from that page's own directory to
//! the target's assigned file.
//!
//! Rewriting is idempotent: a rewritten relative reference, resolved against
//! the page's URL, normalizes back to the same target (local paths mirror
//! the URL's route segments), so a second pass with the same mapping yields
//! byte-identical markup.

use crate::crawler::parser::{LinkRef, RefKind};
use crate::url::{classify, has_resource_extension, normalize_url, UrlClass};
use std::collections::HashMap;
use std::path::Path;
use url::Url;

/// Mapping from normalized URL to output-root-relative local path.
///
/// Assignment is lazy and permanent: once a URL has a path, every later
/// lookup returns the same path, so pages rewritten early stay valid as the
/// crawl keeps discovering the same targets.
#[derive(Debug, Default)]
pub struct PathMap {
    map: HashMap<String, String>,
}

impl PathMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Local path for an HTML-like page URL
    pub fn page_path(&mut self, url: &Url) -> String {
        self.assign(url, true)
    }

    /// Local path for a non-HTML resource URL
    pub fn resource_path(&mut self, url: &Url) -> String {
        self.assign(url, false)
    }

    pub fn get(&self, url: &Url) -> Option<&str> {
        self.map.get(url.as_str()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn assign(&mut self, url: &Url, html_like: bool) -> String {
        if let Some(existing) = self.map.get(url.as_str()) {
            return existing.clone();
        }
        let path = local_path_for(url, html_like);
        self.map.insert(url.as_str().to_string(), path.clone());
        path
    }
}

/// Computes the local path a URL maps to under the output root.
///
/// The path mirrors the URL's route segments. For pages, a trailing-slash
/// route gains `index.html` and an extensionless route gains `.html`, so the
/// entry page at `/` lands on the root `index.html`. Resources keep their
/// segments as-is. The query string never contributes to the path.
pub fn local_path_for(url: &Url, html_like: bool) -> String {
    let mut path = url.path().trim_start_matches('/').to_string();

    if html_like {
        if path.is_empty() || path.ends_with('/') {
            path.push_str("index.html");
        } else if !has_resource_extension(&path) && !html_extension(&path) {
            path.push_str(".html");
        }
    } else {
        while path.ends_with('/') {
            path.pop();
        }
        if path.is_empty() {
            path.push_str("asset");
        }
    }

    path
}

fn html_extension(path: &str) -> bool {
    let last = path.rsplit('/').next().unwrap_or("");
    match last.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            matches!(ext.to_ascii_lowercase().as_str(), "html" | "htm" | "xhtml")
        }
        _ => false,
    }
}

/// Relative reference from one output-relative file to another
pub fn relative_href(from_local: &str, to_local: &str) -> String {
    let from_dir = Path::new(from_local).parent().unwrap_or_else(|| Path::new(""));
    pathdiff::diff_paths(Path::new(to_local), from_dir)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| to_local.to_string())
}

/// Rewrites every intra-site reference in a page's markup to a relative
/// local path.
///
/// For each link-bearing attribute: resolve against the page URL, normalize,
/// classify, look up (or lazily assign) the target's local path, compute the
/// relative path from the page's own directory, and substitute. The query
/// string and fragment of the original reference are re-appended so anchors
/// survive mirroring. External references and unresolvable values are left
/// untouched.
pub fn rewrite_markup(
    markup: &str,
    page_url: &Url,
    page_local_path: &str,
    site_host: &str,
    refs: &[LinkRef],
    paths: &mut PathMap,
) -> String {
    let mut output = markup.to_string();

    for link in refs {
        let Some(rewritten) = rewrite_target(link, page_url, page_local_path, site_host, paths)
        else {
            continue;
        };
        if rewritten == link.value {
            continue;
        }
        substitute_attribute(&mut output, link.attr, &link.value, &rewritten);
    }

    output
}

/// Computes the replacement value for one reference; None leaves it alone
fn rewrite_target(
    link: &LinkRef,
    page_url: &Url,
    page_local_path: &str,
    site_host: &str,
    paths: &mut PathMap,
) -> Option<String> {
    let resolved = page_url.join(&link.value).ok()?;
    let normalized = normalize_url(resolved.as_str(), None).ok()?;

    let local = match link.kind {
        RefKind::Hyperlink => match classify(&normalized, site_host) {
            UrlClass::Internal => paths.page_path(&normalized),
            UrlClass::Resource => paths.resource_path(&normalized),
            UrlClass::External => return None,
        },
        // Resource-bearing attributes: same host is enough, whatever the
        // extension says
        RefKind::Image | RefKind::Stylesheet | RefKind::Script => {
            if normalized.host_str() != Some(site_host) {
                return None;
            }
            paths.resource_path(&normalized)
        }
    };

    let mut rewritten = relative_href(page_local_path, &local);
    if let Some(query) = resolved.query() {
        rewritten.push('?');
        rewritten.push_str(query);
    }
    if let Some(fragment) = resolved.fragment() {
        rewritten.push('#');
        rewritten.push_str(fragment);
    }
    Some(rewritten)
}

/// Replaces `attr="old"` with `attr="new"` in the raw markup, covering both
/// quote styles and the entity-encoded form of the value.
fn substitute_attribute(markup: &mut String, attr: &str, old: &str, new: &str) {
    let encoded_old = old.replace('&', "&amp;");

    for value in [old, encoded_old.as_str()] {
        for quote in ['"', '\''] {
            let pattern = format!("{}={}{}{}", attr, quote, value, quote);
            if markup.contains(&pattern) {
                let replacement = format!("{}={}{}{}", attr, quote, new, quote);
                *markup = markup.replace(&pattern, &replacement);
            }
        }
    }
}
