//! Single-segment HTTP Range GET.

use std::cell::Cell;
use std::str;

use super::metadata::parse_status_line;
use super::HttpOptions;
use crate::error::FetchError;
use crate::segmenter::Segment;

/// Upper bound for the up-front body allocation; larger segments grow as they stream in.
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

const PARTIAL_CONTENT: u32 = 206;

/// Fetches `segment` of `url` and returns exactly `segment.len()` bytes.
///
/// Only a 206 response is accepted. A 200 means the server ignored the range
/// and would send the whole body, so the transfer is cut at the first body
/// byte and reported as [`FetchError::Status`].
pub fn fetch_segment(
    url: &str,
    segment: &Segment,
    opts: &HttpOptions,
) -> Result<Vec<u8>, FetchError> {
    let expected = segment.len();
    let mut body: Vec<u8> = Vec::with_capacity(expected.min(MAX_PREALLOC) as usize);
    let status = Cell::new(0u32);
    let seen = Cell::new(0u64);

    let mut easy = opts.handle(url).map_err(FetchError::Request)?;
    easy.range(&segment.curl_range())
        .map_err(FetchError::Request)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Some(code) = str::from_utf8(data).ok().and_then(parse_status_line) {
                    status.set(code);
                }
                true
            })
            .map_err(FetchError::Request)?;
        transfer
            .write_function(|data| {
                if status.get() != PARTIAL_CONTENT {
                    return Ok(0);
                }
                seen.set(seen.get() + data.len() as u64);
                if seen.get() > expected {
                    return Ok(0);
                }
                body.extend_from_slice(data);
                Ok(data.len())
            })
            .map_err(FetchError::Request)?;

        if let Err(e) = transfer.perform() {
            if !e.is_write_error() {
                return Err(FetchError::from_curl(e));
            }
        }
    }

    let code = easy.response_code().map_err(FetchError::Request)?;
    if code != PARTIAL_CONTENT {
        return Err(FetchError::Status(code));
    }
    let received = seen.get();
    if received != expected {
        return Err(FetchError::LengthMismatch { expected, received });
    }
    Ok(body)
}
