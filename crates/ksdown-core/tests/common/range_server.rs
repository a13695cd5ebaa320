//! Minimal HTTP/1.1 server that supports plain GET and Range GET for integration tests.
//!
//! Serves a single static body. A GET without `Range` returns 200 with the
//! whole body; a GET with `Range: bytes=X-Y` returns 206 with that slice.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, the unranged GET omits `Content-Length` (body is delimited by close).
    pub send_length: bool,
    /// Delay range responses by a start-dependent amount so segments finish out of order.
    pub scramble: bool,
    /// Fixed delay before every range response.
    pub range_delay: Duration,
    /// Fixed delay before any response, ranged or not (a stalling host).
    pub response_delay: Duration,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            support_ranges: true,
            send_length: true,
            scramble: false,
            range_delay: Duration::ZERO,
            response_delay: Duration::ZERO,
        }
    }
}

/// Handle to a running server; the server runs until the process exits.
pub struct RangeServer {
    pub base_url: String,
    range_requests: Arc<AtomicUsize>,
}

impl RangeServer {
    /// URL for `path` on this server (the path is ignored when serving).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Number of GETs received that carried a `Range` header.
    pub fn range_requests(&self) -> usize {
        self.range_requests.load(Ordering::SeqCst)
    }
}

pub fn start(body: Vec<u8>) -> RangeServer {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> RangeServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let range_requests = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&range_requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let counter = Arc::clone(&counter);
            thread::spawn(move || handle(stream, &body, opts, &counter));
        }
    });
    RangeServer {
        base_url: format!("http://127.0.0.1:{}/", port),
        range_requests,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: RangeServerOptions,
    range_requests: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range) = parse_request(request);
    if !opts.response_delay.is_zero() {
        thread::sleep(opts.response_delay);
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    let total = body.len() as u64;

    if let (Some((start, end_incl)), true) = (range, opts.support_ranges) {
        range_requests.fetch_add(1, Ordering::SeqCst);
        if !opts.range_delay.is_zero() {
            thread::sleep(opts.range_delay);
        }
        if opts.scramble {
            thread::sleep(Duration::from_millis((start * 7919 % 7) * 25));
        }
        let end_incl = end_incl.min(total.saturating_sub(1));
        if start > end_incl || start >= total {
            let response = format!(
                "HTTP/1.1 416 Range Not Satisfiable\r\nContent-Range: bytes */{}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                total
            );
            let _ = stream.write_all(response.as_bytes());
            return;
        }
        let slice = &body[start as usize..=end_incl as usize];
        let response = format!(
            "HTTP/1.1 206 Partial Content\r\nContent-Length: {}\r\nContent-Range: bytes {}-{}/{}\r\nAccept-Ranges: bytes\r\nConnection: close\r\n\r\n",
            slice.len(),
            start,
            end_incl,
            total
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.write_all(slice);
        return;
    }

    if range.is_some() {
        range_requests.fetch_add(1, Ordering::SeqCst);
    }
    let length = if opts.send_length {
        format!("Content-Length: {}\r\n", total)
    } else {
        String::new()
    };
    let response = format!("HTTP/1.1 200 OK\r\n{}Connection: close\r\n\r\n", length);
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if value.to_lowercase().starts_with("bytes=") {
                    let part = value[6..].trim();
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end = b.trim();
                        let end_incl = if end.is_empty() {
                            u64::MAX
                        } else {
                            end.parse::<u64>().unwrap_or(0)
                        };
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
