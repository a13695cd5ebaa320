//! Error taxonomy for the download pipeline.
//!
//! Every error here is terminal for its own unit of work (one link, one URL,
//! or one segment) and never aborts sibling work.

use std::path::PathBuf;
use thiserror::Error;

/// A raw link that could not be turned into a plain HTTP(S) URL.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("empty link")]
    Empty,
    #[error("unsupported link scheme (expected http, https or thunder): {0}")]
    UnsupportedScheme(String),
    #[error("invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("thunder payload is not valid base64: {0}")]
    ThunderBase64(#[from] base64::DecodeError),
    #[error("thunder payload has no AA...ZZ markers")]
    ThunderMarkers,
}

/// Failure resolving size and name for a URL. The URL is skipped.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Request(#[from] curl::Error),
    #[error("metadata request returned HTTP {0}")]
    Status(u32),
    #[error("response has no Content-Length header")]
    MissingLength,
    #[error("unparseable Content-Length: {0:?}")]
    InvalidLength(String),
}

/// Failure fetching one segment. The writer is never invoked after one of these.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("connect failed: {0}")]
    Connect(#[source] curl::Error),
    #[error("request timed out: {0}")]
    Timeout(#[source] curl::Error),
    #[error("expected 206 Partial Content, got HTTP {0}")]
    Status(u32),
    #[error("body read failed: {0}")]
    Read(#[source] curl::Error),
    /// Body length differs from the requested range (short read, or the server sent more).
    #[error("body length mismatch: expected {expected} bytes, got {received}")]
    LengthMismatch { expected: u64, received: u64 },
    #[error("request failed: {0}")]
    Request(#[source] curl::Error),
}

impl FetchError {
    /// Sorts a curl failure into connect, timeout, read or generic request errors.
    pub fn from_curl(e: curl::Error) -> Self {
        if e.is_operation_timedout() {
            return FetchError::Timeout(e);
        }
        if e.is_couldnt_connect()
            || e.is_couldnt_resolve_host()
            || e.is_couldnt_resolve_proxy()
            || e.is_ssl_connect_error()
            || e.is_peer_failed_verification()
        {
            return FetchError::Connect(e);
        }
        if e.is_read_error() || e.is_recv_error() || e.is_got_nothing() || e.is_partial_file() {
            return FetchError::Read(e);
        }
        FetchError::Request(e)
    }
}

/// Failure placing bytes into the destination file.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {len} bytes at offset {offset} in {}: {source}", path.display())]
    Write {
        path: PathBuf,
        offset: u64,
        len: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to pre-size {} to {size} bytes: {source}", path.display())]
    Presize {
        path: PathBuf,
        size: u64,
        #[source]
        source: std::io::Error,
    },
}

/// Why a single segment did not land in the destination file.
#[derive(Debug, Error)]
pub enum SegmentFailure {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("skipped: shutdown requested before the segment started")]
    Cancelled,
}
