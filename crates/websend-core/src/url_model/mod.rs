//! Local file naming for downloaded remote references.
//!
//! A downloaded resource is named after the server's `Content-Disposition`
//! filename hint when there is one, else after the last segment of the URL
//! path (query string and fragment dropped). Names are sanitized so they can
//! never escape the download directory.

mod disposition;
mod sanitize;

pub use disposition::filename_hint;
pub use sanitize::sanitize_filename;

/// Name used when neither the response nor the URL yields anything usable.
pub const FALLBACK_FILENAME: &str = "download.bin";

/// Last non-empty path segment of `url`, percent-decoded, without query or fragment.
///
/// Returns `None` when the URL does not parse or has no path segment.
pub fn url_path_tail(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    let decoded = disposition::percent_decode(segment);
    if decoded.is_empty() {
        None
    } else {
        Some(decoded)
    }
}

/// Chooses the local filename for `url`, preferring the response's filename hint.
///
/// - `local_filename("https://example.com/a/b.wav?x=1", None)` → `"b.wav"`
/// - `local_filename("https://example.com/get", Some("attachment; filename=\"s.TextGrid\""))` → `"s.TextGrid"`
pub fn local_filename(url: &str, content_disposition: Option<&str>) -> String {
    let candidate = content_disposition
        .and_then(filename_hint)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty());

    let name = candidate.or_else(|| {
        url_path_tail(url)
            .map(|tail| sanitize_filename(&tail))
            .filter(|name| !name.is_empty())
    });

    name.unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}
