//! HTTP `Range` header parsing.
//!
//! Only the single-range forms `bytes=<start>-<end>` and `bytes=<start>-` are
//! honored. Anything else falls back to a full response rather than a 400, so
//! players that send odd headers still get the file.

use std::fmt;

/// Inclusive byte interval, `start <= end < total_length`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered (the range is inclusive).
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Always false; a satisfiable range covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// `Content-Range` value for a 206 response.
    pub fn content_range(&self, total_length: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, total_length)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Outcome of matching a `Range` header against a known length.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeDecision {
    /// Serve the whole entity.
    Full,
    /// Serve the given window.
    Partial(ByteRange),
    /// The request cannot be satisfied for this length (416).
    Unsatisfiable,
}

/// `Content-Range` value for a 416 response.
pub fn unsatisfied_content_range(total_length: u64) -> String {
    format!("bytes */{total_length}")
}

/// Decide how to answer a request given its `Range` header.
pub fn parse(header: Option<&str>, total_length: u64) -> RangeDecision {
    let Some(header) = header else {
        return RangeDecision::Full;
    };
    let Some(ranges) = header.trim().strip_prefix("bytes=") else {
        return RangeDecision::Full;
    };
    if ranges.contains(',') {
        return RangeDecision::Full;
    }
    let Some((start, end)) = ranges.split_once('-') else {
        return RangeDecision::Full;
    };

    let start = start.trim();
    let end = end.trim();
    // Suffix ranges ("bytes=-500") are not supported.
    if start.is_empty() {
        return RangeDecision::Full;
    }
    let Some(start) = parse_bound(start) else {
        return RangeDecision::Full;
    };
    let end = if end.is_empty() {
        None
    } else {
        match parse_bound(end) {
            Some(end) => Some(end),
            None => return RangeDecision::Full,
        }
    };

    if start >= total_length {
        return RangeDecision::Unsatisfiable;
    }
    let last = total_length - 1;
    let end = end.map_or(last, |end| end.min(last));
    if start > end {
        return RangeDecision::Unsatisfiable;
    }
    RangeDecision::Partial(ByteRange { start, end })
}

/// Digits only. Values past `u64::MAX` saturate, so they still clamp or
/// fail against the length like any other out-of-range bound.
fn parse_bound(s: &str) -> Option<u64> {
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u64::MAX))
}
