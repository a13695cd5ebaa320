//! Segment type and range partitioning.

/// A single segment: byte range [start, end) (half-open).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Start offset (inclusive).
    pub start: u64,
    /// End offset (exclusive).
    pub end: u64,
}

impl Segment {
    /// Length of this segment in bytes.
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// HTTP Range header value (inclusive end): `bytes=start-(end-1)`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}", self.curl_range())
    }

    /// Range in the `start-end` (inclusive) form curl's `CURLOPT_RANGE` expects.
    pub fn curl_range(&self) -> String {
        if self.is_empty() {
            format!("{}-{}", self.start, self.start)
        } else {
            format!("{}-{}", self.start, self.end - 1)
        }
    }
}

/// Splits `total_size` bytes into `segment_count` contiguous segments.
///
/// Every segment but the last is `total_size / n` bytes long; the last one
/// always ends at `total_size` and absorbs the division remainder. The
/// segment count is bounded to `total_size` so no segment is ever empty, and
/// a count of 0 is treated as 1. A zero-byte file yields no segments.
pub fn partition(total_size: u64, segment_count: usize) -> Vec<Segment> {
    if total_size == 0 {
        return Vec::new();
    }

    let n = (segment_count.max(1) as u64).min(total_size);
    let base = total_size / n;

    (0..n)
        .map(|i| {
            let start = i * base;
            let end = if i == n - 1 { total_size } else { start + base };
            Segment { start, end }
        })
        .collect()
}
