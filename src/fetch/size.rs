// src/fetch/size.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use url::Url;

use super::DatasetSource;
use crate::error::{Error, Result};

const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

static CONTENT_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*bytes\s+(\d+)-(\d+)/(\d+|\*)\s*$")
        .expect("Content-Range regex should parse")
});

/// Render a byte count in the largest 1024-based unit that keeps the value
/// at or above 1, e.g. `1536` → `"1.5 KB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }
    let mut unit = 0;
    let mut rest = bytes;
    while rest >= 1024 && unit < UNITS.len() - 1 {
        rest /= 1024;
        unit += 1;
    }
    let value = bytes as f64 / 1024f64.powi(unit as i32);
    // halves go to the even hundredth
    let rounded = (value * 100.0).round_ties_even() / 100.0;

    // two decimals at most, but always at least one
    let mut text = format!("{:.2}", rounded);
    while text.ends_with('0') && !text.ends_with(".0") {
        text.pop();
    }
    format!("{} {}", text, UNITS[unit])
}

/// Extract the total length from a `bytes X-Y/TOTAL` header value.
pub fn parse_content_range(header: &str) -> Result<u64> {
    let caps = CONTENT_RANGE_RE
        .captures(header)
        .ok_or_else(|| Error::SizeProbe(format!("malformed Content-Range {:?}", header)))?;
    caps[3]
        .parse()
        .map_err(|_| Error::SizeProbe(format!("no total length in Content-Range {:?}", header)))
}

/// Remote size of `url`, or `None` when the server won't tell.
pub async fn probe_size<S: DatasetSource>(source: &S, url: &Url) -> Option<u64> {
    let header = match source.content_range(url).await {
        Ok(h) => h,
        Err(e) => {
            warn!(%url, error = %e, "size probe failed; continuing");
            return None;
        }
    };
    match parse_content_range(&header) {
        Ok(total) => Some(total),
        Err(e) => {
            warn!(%url, error = %e, "size probe failed; continuing");
            None
        }
    }
}

pub fn describe_size(size: Option<u64>) -> String {
    size.map(format_size)
        .unwrap_or_else(|| "unknown size".to_string())
}
