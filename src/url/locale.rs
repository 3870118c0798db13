//! Locale heuristic for english-only mode
//!
//! Decides, from the URL alone, whether a page looks like a non-English
//! variant of the site's content. The rule is deliberately approximate and
//! fails open: anything ambiguous is NOT skipped, so primary content is
//! never dropped silently. Page content is never inspected.

use url::Url;

/// Path segments that mark a translation area of a site
const LOCALE_AREAS: &[&str] = &["translations", "intl", "i18n"];

/// Language names that show up as path segments on multilingual sites
const LANGUAGE_NAMES: &[&str] = &[
    "spanish",
    "espanol",
    "español",
    "francais",
    "français",
    "deutsch",
    "italiano",
    "portugues",
    "português",
    "русский",
    "日本語",
    "中文",
    "한국어",
];

/// Returns true if the URL matches a recognized non-English locale pattern.
///
/// Indicators, in the order they are checked:
/// - a path segment that is a two-letter language code, optionally with a
///   region suffix (`/fr/`, `/pt-br/`), other than `en`/`en-*`
/// - a path segment naming a translation area (`/translations/`, `/i18n/`)
/// - a path segment naming a language in its own tongue (`/deutsch/`)
/// - an `hl=` or `lang=` query parameter whose value does not start with `en`
pub fn is_non_primary_locale(url: &Url) -> bool {
    if let Some(segments) = url.path_segments() {
        for segment in segments {
            let lower = segment.to_lowercase();

            if is_language_code(&lower) && !lower.starts_with("en") {
                return true;
            }

            if LOCALE_AREAS.contains(&lower.as_str()) || LANGUAGE_NAMES.contains(&lower.as_str()) {
                return true;
            }
        }
    }

    for (key, value) in url.query_pairs() {
        if key != "hl" && key != "lang" {
            continue;
        }
        let lower = value.to_lowercase();
        if !lower.is_empty() && !lower.starts_with("en") {
            return true;
        }
    }

    false
}

/// Matches `xx` and `xx-yy` shaped segments (lowercased input)
fn is_language_code(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    match bytes.len() {
        2 => bytes.iter().all(u8::is_ascii_lowercase),
        5 => {
            bytes[2] == b'-'
                && bytes[..2].iter().all(u8::is_ascii_lowercase)
                && bytes[3..].iter().all(u8::is_ascii_lowercase)
        }
        _ => false,
    }
}
