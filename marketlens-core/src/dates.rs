//! Canonical date assembly from the (year, month-day code) field pair.
//!
//! The month-day code is a compact 2–4 digit token: `"115"` zero-pads to
//! `"0115"` and reads as January 15; a token of printed length ≤ 2 is a
//! month-only code and the day defaults to 1. Assembly is evaluated per row
//! so a malformed row never aborts the whole dataset — it simply yields no
//! date and is excluded from everything downstream.

use chrono::NaiveDate;

/// Assemble a calendar date from a year and a month-day code token.
///
/// Returns `None` for empty, non-numeric, over-long, or calendar-invalid
/// inputs (month 13, Feb 29 outside leap years, ...).
pub fn assemble_date(year: i32, code: &str) -> Option<NaiveDate> {
    let token = code.trim();
    if token.is_empty() || token.len() > 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (month, day) = if token.len() <= 2 {
        (token.parse::<u32>().ok()?, 1)
    } else {
        let padded = format!("{token:0>4}");
        let month = padded[..2].parse::<u32>().ok()?;
        let day = padded[2..].parse::<u32>().ok()?;
        (month, day)
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Per-row assembly over optional fields, as read from the store.
pub fn assemble_opt(year: Option<i32>, code: Option<&str>) -> Option<NaiveDate> {
    assemble_date(year?, code?)
}
