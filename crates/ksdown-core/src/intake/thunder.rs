//! `thunder://` link decoding.

use base64::Engine as _;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::IntakeError;

pub const THUNDER_PREFIX: &str = "thunder://";

fn markers() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)AA(.*)ZZ").expect("valid marker regex"))
}

/// Decodes a `thunder://<base64>` link into the URL between the `AA` and `ZZ` markers.
///
/// The prefix is matched case-insensitively; the payload uses the standard
/// base64 alphabet and may have surrounding whitespace or a trailing `/`.
pub fn decode_thunder(link: &str) -> Result<String, IntakeError> {
    let payload = link
        .trim()
        .get(THUNDER_PREFIX.len()..)
        .unwrap_or("")
        .trim()
        .trim_end_matches('/');

    let bytes = base64::engine::general_purpose::STANDARD.decode(payload)?;
    let text = String::from_utf8_lossy(&bytes);

    let inner = markers()
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(IntakeError::ThunderMarkers)?;
    Ok(inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(s: &str) -> String {
        base64::engine::general_purpose::STANDARD.encode(s)
    }

    #[test]
    fn decodes_marked_payload() {
        let link = format!("thunder://{}", encode("AAhttps://cdn.example.com/movie.mkvZZ"));
        assert_eq!(decode_thunder(&link).unwrap(), "https://cdn.example.com/movie.mkv");
    }

    #[test]
    fn prefix_is_case_insensitive_and_trailing_slash_ok() {
        let link = format!("THUNDER://{}/", encode("AAhttp://x/y.mp4ZZ"));
        assert_eq!(decode_thunder(&link).unwrap(), "http://x/y.mp4");
    }

    #[test]
    fn invalid_base64() {
        assert!(matches!(
            decode_thunder("thunder://!!!not-base64!!!"),
            Err(IntakeError::ThunderBase64(_))
        ));
    }

    #[test]
    fn empty_between_markers() {
        let link = format!("thunder://{}", encode("AAZZ"));
        assert!(matches!(decode_thunder(&link), Err(IntakeError::ThunderMarkers)));
    }
}
