// src/size.rs
//! Human-readable download sizes ("12.3 GB", "512 MB") to megabytes.

use once_cell::sync::OnceCell;
use regex::Regex;

fn size_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([\d.]+)\s*(MB|GB)$").expect("size regex"))
}

/// Parse a size string into megabytes. GB is scaled by 1024.
///
/// Anything that does not match `<number> MB|GB` (whole string) yields `0.0`,
/// so unparsable sizes sort as the smallest possible value.
pub fn parse_size(text: &str) -> f64 {
    let Some(caps) = size_re().captures(text.trim()) else {
        return 0.0;
    };
    let value: f64 = match caps[1].parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    if !value.is_finite() {
        return 0.0;
    }
    if caps[2].eq_ignore_ascii_case("gb") {
        value * 1024.0
    } else {
        value
    }
}
