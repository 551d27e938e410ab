//! File name derivation: URL basename extraction and slug normalization.

use percent_encoding::percent_decode_str;
use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

use crate::error::PipelineError;

/// Returns the last path segment of `src` with its extension stripped.
///
/// The extension is everything from the last `.` of the segment, so
/// `archive.tar.gz` yields `archive.tar`. Query strings and fragments are
/// ignored for parseable URLs; the segment is percent-decoded.
pub fn base_without_ext(src: &str) -> String {
    let segment = last_segment(src);
    match segment.rfind('.') {
        Some(dot) => segment[..dot].to_string(),
        None => segment,
    }
}

fn last_segment(src: &str) -> String {
    let raw = match url::Url::parse(src) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
            .unwrap_or_default()
            .to_string(),
        Err(_) => src
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let decoded = percent_decode_str(&raw)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned);
    decoded.unwrap_or(raw)
}

/// Turns a candidate name into a lowercase, diacritic-free slug.
///
/// Trim, NFD, drop non-spacing marks, NFC, lowercase, then spaces become
/// underscores: `"  Café Déjà "` becomes `"cafe_deja"`. An empty input yields
/// an empty slug. `&str` is always valid UTF-8, so this never fails today.
pub fn normalize(raw: &str) -> Result<String, PipelineError> {
    let stripped: String = raw
        .trim()
        .nfd()
        .filter(|c| !is_nonspacing_mark(*c))
        .nfc()
        .collect();
    Ok(stripped.to_lowercase().replace(' ', "_"))
}

fn is_nonspacing_mark(c: char) -> bool {
    get_general_category(c) == GeneralCategory::NonspacingMark
}

/// Normalizes the explicit override, or the basename of `src` when the
/// override is absent or empty.
pub fn resolve_name(src: &str, name: Option<&str>) -> Result<String, PipelineError> {
    match name.filter(|n| !n.is_empty()) {
        Some(name) => normalize(name),
        None => normalize(&base_without_ext(src)),
    }
}
