//! Simulation time model.
//!
//! The canonical unit is one second of simulated day, stored as `i32`
//! (`Seconds`).  All schedule arithmetic is exact integer math.  Two external
//! encodings exist:
//!
//! - `HHMMSS` integers on the command line and in log output
//!   (`93005` = 09:30:05),
//! - `(h)h:mm:ss` clock strings in the request CSV.

use crate::error::{CoreError, CoreResult};

/// Seconds of simulated day.  Signed so that window slack and cost deltas
/// can be computed without casts.
pub type Seconds = i32;

/// Seconds-of-day → `HHMMSS` integer.
///
/// Inverse of [`decode_hms`] on `[0, 86400)`.  Hours are not wrapped, so a
/// run past midnight encodes as `24xxxx` and beyond — matching the input
/// convention where `FINAL_TIME 240000` means end of day.
#[inline]
pub fn encode_hms(s: Seconds) -> i32 {
    10_000 * (s / 3_600) + 100 * ((s / 60) % 60) + s % 60
}

/// `HHMMSS` integer → seconds-of-day.
#[inline]
pub fn decode_hms(hms: i32) -> Seconds {
    let hour = (hms / 10_000) % 100;
    let minute = (hms / 100) % 100;
    let second = hms % 100;
    3_600 * hour + 60 * minute + second
}

/// Parse a `(h)h:mm:ss` clock string as used in the request CSV.
///
/// Single-digit fields are accepted in every position (`7:5:3` = 07:05:03).
pub fn parse_clock(s: &str) -> CoreResult<Seconds> {
    let mut flat = String::with_capacity(6);
    for token in s.trim().split(':') {
        if token.is_empty() || token.len() > 2 || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::Parse(format!("bad clock string {s:?}")));
        }
        if token.len() == 1 {
            flat.push('0');
        }
        flat.push_str(token);
    }
    if flat.len() != 6 {
        return Err(CoreError::Parse(format!("bad clock string {s:?}")));
    }
    let hms: i32 = flat
        .parse()
        .map_err(|_| CoreError::Parse(format!("bad clock string {s:?}")))?;
    Ok(decode_hms(hms))
}
