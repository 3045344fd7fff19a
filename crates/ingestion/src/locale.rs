//! Locale-aware field parsing.
//!
//! Exports use "," as decimal separator and "." for thousands, regardless of
//! the file encoding. Dates come in two marketplace-specific shapes.

use chrono::NaiveDate;

/// Calendar day and hour of day taken from a report timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateHour {
    pub date: NaiveDate,
    /// Hour of day, 0 to 23.
    pub hour: u8,
}

/// Parse a locale-formatted number ("1.234,56 €" -> 1234.56).
///
/// Currency symbols, percent signs and all whitespace are ignored. Empty,
/// dash-only and unparsable input yields 0; this function never fails.
pub fn parse_number(text: &str) -> f64 {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '€' | '$' | '£' | '%'))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }

    let mut normalized = cleaned.replace('.', "");
    if let Some(pos) = normalized.find(',') {
        normalized.replace_range(pos..pos + 1, ".");
    }

    leading_float(&normalized).unwrap_or(0.0)
}

/// Parse the longest numeric prefix ("12.5abc" -> 12.5).
fn leading_float(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let mut seen_digit = false;
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => seen_digit = true,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if !seen_digit {
        return None;
    }
    s[..end].parse().ok()
}

/// Month number for an English or German three-letter abbreviation.
fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" | "mär" | "mrz" => 3,
        "apr" => 4,
        "may" | "mai" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" | "okt" => 10,
        "nov" => 11,
        "dec" | "dez" => 12,
        numeric => return numeric.parse().ok().filter(|m| (1..=12).contains(m)),
    };
    Some(month)
}

/// Parse a "DD-Mon-YY" sale date ("18-Feb-26" -> 2026-02-18).
///
/// Two-digit years above 50 map to 19YY, all others to 20YY.
pub fn parse_short_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.trim().split('-');
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let day: u32 = day.trim().parse().ok()?;
    let month = month_from_abbrev(month.trim())?;
    let year = year.trim();
    let year: i32 = match year.len() {
        2 => {
            let yy: i32 = year.parse().ok()?;
            if yy > 50 {
                1900 + yy
            } else {
                2000 + yy
            }
        }
        4 => year.parse().ok()?,
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a "DD.MM.YYYY HH:MM:SS TZ" timestamp.
///
/// A missing or malformed time part maps to hour 0; a malformed date is `None`.
pub fn parse_timestamp(text: &str) -> Option<DateHour> {
    let mut tokens = text.split_whitespace();
    let mut dmy = tokens.next()?.split('.');
    let (day, month, year) = (dmy.next()?, dmy.next()?, dmy.next()?);
    if dmy.next().is_some() {
        return None;
    }

    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    let hour = tokens
        .next()
        .and_then(|time| time.split(':').next())
        .and_then(|h| h.parse::<u8>().ok())
        .filter(|h| *h < 24)
        .unwrap_or(0);

    Some(DateHour { date, hour })
}
