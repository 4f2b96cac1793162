// src/dates.rs
//! Upload-date parsing. Feeds mostly publish RFC 3339, some only a bare date.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Floor used before any upload date has been seen.
pub const EPOCH_FLOOR: &str = "1970-01-01";

/// Parse an upload date into a UTC instant. Returns `None` when nothing fits.
pub fn parse_upload_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
        }
    }
    None
}

/// True when `candidate` is a strictly later calendar instant than `current`.
/// Unparsable candidates never win; an unparsable `current` loses to any valid candidate.
pub fn is_later(candidate: &str, current: &str) -> bool {
    match (parse_upload_date(candidate), parse_upload_date(current)) {
        (Some(c), Some(cur)) => c > cur,
        (Some(_), None) => true,
        _ => false,
    }
}
