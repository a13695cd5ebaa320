//! Link intake: turns raw strings into plain HTTP(S) URLs.
//!
//! Accepts `http://`, `https://` and `thunder://` links. Thunder links carry
//! a base64 payload wrapping the real URL as `AA<url>ZZ`.

mod filename;
mod sanitize;
mod thunder;

pub use filename::{derive_filename, filename_from_url_path};
pub use sanitize::sanitize_filename;
pub use thunder::{decode_thunder, THUNDER_PREFIX};

use crate::error::IntakeError;

/// Schemes accepted on intake, for log and usage messages.
pub const ACCEPTED_SCHEMES: [&str; 3] = ["http", "https", "thunder"];

/// Resolves one raw link into a plain HTTP(S) URL.
///
/// Leading and trailing whitespace is ignored. Thunder links are decoded and
/// the embedded URL must itself be HTTP(S).
pub fn resolve_link(raw: &str) -> Result<String, IntakeError> {
    let link = raw.trim();
    if link.is_empty() {
        return Err(IntakeError::Empty);
    }

    let candidate = if has_prefix_ignore_case(link, THUNDER_PREFIX) {
        decode_thunder(link)?
    } else {
        link.to_string()
    };

    validate_http_url(&candidate)?;
    Ok(candidate)
}

/// Splits a batch of links separated by commas, LF or CRLF. Blank entries are dropped.
pub fn split_batch(text: &str) -> Vec<String> {
    text.split(|c: char| c == ',' || c == '\n' || c == '\r')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn validate_http_url(candidate: &str) -> Result<(), IntakeError> {
    let parsed = url::Url::parse(candidate).map_err(|source| IntakeError::InvalidUrl {
        url: candidate.to_string(),
        source,
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(IntakeError::UnsupportedScheme(candidate.to_string())),
    }
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.len() >= prefix.len()
        && s.is_char_boundary(prefix.len())
        && s[..prefix.len()].eq_ignore_ascii_case(prefix)
}
