use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL according to Kagami's normalization rules
///
/// # Normalization Steps
///
/// 1. Resolve the reference against `base` (when given); reject if malformed
/// 2. Validate the scheme: only HTTP and HTTPS are crawlable
/// 3. Lowercase scheme and host, drop default ports (the `url` crate
///    performs both during parsing)
/// 4. Collapse duplicate slashes in the path, preserving a trailing slash
///    (a trailing slash selects a different local file than its absence)
/// 5. Remove the fragment
///
/// Dot segments are already folded by WHATWG reference resolution, and the
/// query string is kept untouched: two URLs differing only in query are
/// distinct crawl nodes.
///
/// # Examples
///
/// ```
/// use kagami::url::normalize_url;
///
/// let url = normalize_url("HTTPS://EXAMPLE.COM//a//b/#intro", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/a/b/");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> UrlResult<Url> {
    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let path = url.path();
    if path.contains("//") {
        url.set_path(&collapse_slashes(path));
    }

    url.set_fragment(None);

    Ok(url)
}

/// Collapses runs of slashes in a path, keeping a single trailing slash
fn collapse_slashes(path: &str) -> String {
    let trailing = path.ends_with('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    let mut result = format!("/{}", segments.join("/"));
    if trailing {
        result.push('/');
    }
    result
}
