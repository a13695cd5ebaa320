//! Destination filename derivation from a URL.

use super::sanitize::sanitize_filename;

/// Filename used when the URL path yields nothing usable.
const DEFAULT_FILENAME: &str = "download.bin";

/// Extracts the last path segment from a URL for use as a filename hint.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
/// Query string and fragment are ignored.
pub fn filename_from_url_path(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}

/// Derives a safe filename for saving `url`: the sanitized last path segment,
/// or `download.bin` when there is none.
///
/// Two URLs with the same last segment map to the same name.
pub fn derive_filename(url: &str) -> String {
    filename_from_url_path(url)
        .map(|raw| sanitize_filename(&raw))
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_segment() {
        assert_eq!(
            filename_from_url_path("https://example.com/a/b/file.deb").as_deref(),
            Some("file.deb")
        );
        assert_eq!(
            filename_from_url_path("https://example.com/file.zip?token=abc").as_deref(),
            Some("file.zip")
        );
        assert_eq!(filename_from_url_path("https://example.com/"), None);
        assert_eq!(filename_from_url_path("https://example.com"), None);
    }

    #[test]
    fn derive_falls_back_to_default() {
        assert_eq!(derive_filename("http://x/y.mp4"), "y.mp4");
        assert_eq!(derive_filename("http://x/"), "download.bin");
        assert_eq!(derive_filename("http://x/.."), "download.bin");
    }

    #[test]
    fn same_basename_same_name() {
        assert_eq!(
            derive_filename("http://a.example/one/video.mp4"),
            derive_filename("http://b.example/two/video.mp4")
        );
    }
}
