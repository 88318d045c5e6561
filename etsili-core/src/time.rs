//! Generalized-time conversions
//!
//! ETSI LI timestamps travel as ASN.1 GeneralizedTime strings. On encode we
//! always emit the compact `YYMMDDhhmmss.mmmZ` form in UTC; on decode we
//! accept the full `YYYYMMDDhhmmss[.frac][Z|+hhmm|-hhmm]` shape and convert
//! to epoch seconds.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EtsiliError, EtsiliResult};

/// Seconds + microseconds, the record timestamp representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timeval {
    pub sec: i64,
    pub usec: i64,
}

impl Timeval {
    pub fn new(sec: i64, usec: i64) -> Self {
        Timeval { sec, usec }
    }
}

/// Format a timeval as a generalized/UTC time string: `YYMMDDhhmmss.mmmZ`.
///
/// Both GeneralizedTime and UTCTime fields use the same two-digit-year
/// rendering on the wire in this record format.
pub fn format_generalized(tv: Timeval) -> EtsiliResult<String> {
    let dt: DateTime<Utc> = Utc
        .timestamp_opt(tv.sec, 0)
        .single()
        .ok_or_else(|| EtsiliError::InvalidTime(format!("timestamp out of range: {}", tv.sec)))?;

    Ok(format!(
        "{}.{:03}Z",
        dt.format("%y%m%d%H%M%S"),
        tv.usec / 1000
    ))
}

/// Parse a generalized time string into a Timeval.
///
/// The first 14 characters are `YYYYMMDDhhmmss`; an optional fractional part
/// follows a `.`, terminated by `Z` or a `+hhmm`/`-hhmm` zone offset. The
/// fractional digits are accumulated as milliseconds, matching the encoder.
pub fn parse_generalized(gts: &str) -> EtsiliResult<Timeval> {
    if gts.len() < 14 {
        return Err(EtsiliError::InvalidTime(format!(
            "generalized time string '{}' is too short",
            gts
        )));
    }

    let bytes = gts.as_bytes();
    let mut ms: u32 = 0;
    let mut zone = 0usize; // offset of the zone designator, 0 = none seen

    if bytes.get(14) == Some(&b'.') {
        let mut idx = 15;
        while idx < bytes.len() {
            let c = bytes[idx];
            if c == b'Z' || c == b'+' || c == b'-' {
                zone = idx;
                break;
            }
            if !c.is_ascii_digit() {
                return Err(EtsiliError::InvalidTime(format!(
                    "unexpected character in generalized time string '{}' ({})",
                    gts, c as char
                )));
            }
            ms = ms * 10 + (c - b'0') as u32;
            idx += 1;
        }
    } else if bytes.len() > 14 {
        zone = 14;
    }

    let naive = NaiveDateTime::parse_from_str(&gts[..14], "%Y%m%d%H%M%S")
        .map_err(|e| EtsiliError::InvalidTime(format!("cannot parse '{}': {}", gts, e)))?;

    // The broken-down time is in the zone named by the suffix; normalize
    // back to UTC. A missing designator is treated as UTC.
    let mut sec = naive.and_utc().timestamp();
    if zone != 0 {
        match bytes[zone] {
            b'Z' => {}
            sign @ (b'+' | b'-') => {
                let off = zone_to_offset(&bytes[zone + 1..])?;
                if sign == b'+' {
                    sec -= off;
                } else {
                    sec += off;
                }
            }
            _ => {}
        }
    }

    Ok(Timeval {
        sec,
        usec: (ms as i64) * 1000,
    })
}

fn zone_to_offset(digits: &[u8]) -> EtsiliResult<i64> {
    if digits.len() < 4 || !digits[..4].iter().all(u8::is_ascii_digit) {
        return Err(EtsiliError::InvalidTime(
            "malformed zone offset in generalized time".to_string(),
        ));
    }
    let hours = ((digits[0] - b'0') * 10 + (digits[1] - b'0')) as i64;
    let mins = ((digits[2] - b'0') * 10 + (digits[3] - b'0')) as i64;
    Ok(hours * 3600 + mins * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_generalized() {
        // 2009-02-13 23:31:30 UTC
        let s = format_generalized(Timeval::new(1234567890, 500000)).unwrap();
        assert_eq!(s, "090213233130.500Z");
    }

    #[test]
    fn test_parse_generalized_utc() {
        let tv = parse_generalized("20090213233130.500Z").unwrap();
        assert_eq!(tv.sec, 1234567890);
        assert_eq!(tv.usec, 500000);
    }

    #[test]
    fn test_parse_generalized_offset() {
        // +0200 means the wall clock is two hours ahead of UTC
        let utc = parse_generalized("20090213233130Z").unwrap();
        let ahead = parse_generalized("20090214013130+0200").unwrap();
        assert_eq!(utc.sec, ahead.sec);

        let behind = parse_generalized("20090213203130-0300").unwrap();
        assert_eq!(utc.sec, behind.sec);
    }

    #[test]
    fn test_parse_too_short() {
        assert!(parse_generalized("20090213").is_err());
    }

    #[test]
    fn test_parse_bad_fraction() {
        assert!(parse_generalized("20090213233130.5x0Z").is_err());
    }
}
