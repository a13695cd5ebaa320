//! Size and name resolution for a URL.
//!
//! Issues a plain GET (some hosts reject HEAD), keeps the response headers and
//! aborts the transfer at the first body byte so the body is never buffered.

use std::str;

use super::HttpOptions;
use crate::error::MetadataError;
use crate::intake::derive_filename;

/// What the engine needs to know before partitioning a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub url: String,
    pub file_name: String,
    pub total_size: u64,
}

/// Resolves `url` to its destination name and `Content-Length`.
pub fn resolve_metadata(url: &str, opts: &HttpOptions) -> Result<FileMetadata, MetadataError> {
    let mut headers: Vec<String> = Vec::new();
    let mut easy = opts.handle(url)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(s) = str::from_utf8(data) {
                headers.push(s.trim_end().to_string());
            }
            true
        })?;
        // Returning 0 makes curl stop with a write error once the body starts.
        transfer.write_function(|_| Ok(0))?;
        match transfer.perform() {
            Ok(()) => {}
            Err(e) if e.is_write_error() => {}
            Err(e) => return Err(MetadataError::Request(e)),
        }
    }

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(MetadataError::Status(code));
    }

    let total_size = parse_content_length(&headers)?;
    Ok(FileMetadata {
        url: url.to_string(),
        file_name: derive_filename(url),
        total_size,
    })
}

/// Status code from an `HTTP/x.y NNN reason` line.
pub fn parse_status_line(line: &str) -> Option<u32> {
    let mut parts = line.split_whitespace();
    let proto = parts.next()?;
    if !proto.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

/// `Content-Length` of the last response in `lines`.
///
/// With redirects curl reports several header blocks; each status line starts
/// a new block, so only the final response's length counts.
pub(crate) fn parse_content_length(lines: &[String]) -> Result<u64, MetadataError> {
    let mut content_length: Option<&str> = None;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if parse_status_line(line).is_some() {
            content_length = None;
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                content_length = Some(value.trim());
            }
        }
    }

    let raw = content_length.ok_or(MetadataError::MissingLength)?;
    raw.parse::<u64>()
        .map_err(|_| MetadataError::InvalidLength(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn content_length_parsed() {
        let l = lines(&["HTTP/1.1 200 OK", "content-length: 12345", "Accept-Ranges: bytes"]);
        assert_eq!(parse_content_length(&l).unwrap(), 12345);
    }

    #[test]
    fn redirect_length_does_not_leak() {
        let l = lines(&[
            "HTTP/1.1 302 Found",
            "Content-Length: 17",
            "Location: /real",
            "",
            "HTTP/1.1 200 OK",
            "Transfer-Encoding: chunked",
        ]);
        assert!(matches!(parse_content_length(&l), Err(MetadataError::MissingLength)));

        let l = lines(&[
            "HTTP/1.1 301 Moved",
            "Content-Length: 17",
            "",
            "HTTP/2 200",
            "content-length: 4096",
        ]);
        assert_eq!(parse_content_length(&l).unwrap(), 4096);
    }

    #[test]
    fn non_numeric_length() {
        let l = lines(&["HTTP/1.1 200 OK", "Content-Length: lots"]);
        match parse_content_length(&l) {
            Err(MetadataError::InvalidLength(v)) => assert_eq!(v, "lots"),
            other => panic!("expected InvalidLength, got {:?}", other),
        }
    }

    #[test]
    fn status_lines() {
        assert_eq!(parse_status_line("HTTP/1.1 206 Partial Content"), Some(206));
        assert_eq!(parse_status_line("HTTP/2 200"), Some(200));
        assert_eq!(parse_status_line("Content-Length: 5"), None);
    }
}
