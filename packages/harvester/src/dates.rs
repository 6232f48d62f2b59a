//! Date conversions used by the bulletin extractors.
//!
//! Bulletins write dates in three ways: spelled out in English or French
//! ("2 January 2025", "7 janvier 2025", "2025 JULY 1"), as a Modified
//! Julian Day number, or as separate year/month/day XML elements.

use chrono::{Duration, NaiveDate};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{HarvesterError, Result};

/// Modified Julian Day of 2000-01-01.
pub const MJD_2000: i64 = 51544;

/// English and French month names.
const MONTHS: [(&str, u32); 24] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("janvier", 1),
    ("fevrier", 2),
    ("mars", 3),
    ("avril", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("aout", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("novembre", 11),
    ("decembre", 12),
];

/// Order of the three tokens in a spelled-out date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldOrder {
    /// `2 January 2025`
    #[default]
    DayMonthYear,
    /// `2025 January 2`
    YearMonthDay,
}

/// Look up a month name, ignoring case and accents.
fn month_number(name: &str) -> Option<u32> {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    MONTHS
        .iter()
        .find(|(month, _)| *month == folded)
        .map(|(_, number)| *number)
}

/// Parse a date written as three tokens with a month name.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use iers_harvester::dates::{parse_named_date, FieldOrder};
///
/// let date = parse_named_date("2 January 2025", FieldOrder::DayMonthYear).unwrap();
/// assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
///
/// let date = parse_named_date("2017 JANUARY 1", FieldOrder::YearMonthDay).unwrap();
/// assert_eq!(date, NaiveDate::from_ymd_opt(2017, 1, 1).unwrap());
/// ```
pub fn parse_named_date(text: &str, order: FieldOrder) -> Result<NaiveDate> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [first, month, last] = tokens.as_slice() else {
        return Err(HarvesterError::parse(
            format!("date '{text}'"),
            format!("expected 3 fields, found {}", tokens.len()),
        ));
    };

    let (day, year) = match order {
        FieldOrder::DayMonthYear => (first, last),
        FieldOrder::YearMonthDay => (last, first),
    };

    let month = month_number(month).ok_or_else(|| {
        HarvesterError::parse(format!("date '{text}'"), format!("unknown month '{month}'"))
    })?;
    let day: u32 = day
        .parse()
        .map_err(|_| HarvesterError::parse(format!("date '{text}'"), format!("invalid day '{day}'")))?;
    let year: i32 = year.parse().map_err(|_| {
        HarvesterError::parse(format!("date '{text}'"), format!("invalid year '{year}'"))
    })?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| HarvesterError::parse(format!("date '{text}'"), "not a calendar date"))
}

/// Convert a Modified Julian Day number to a calendar date.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use iers_harvester::dates::mjd_to_date;
///
/// assert_eq!(mjd_to_date(51544).unwrap(), NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
/// ```
pub fn mjd_to_date(mjd: i64) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .zip(Duration::try_days(mjd - MJD_2000))
        .and_then(|(epoch, offset)| epoch.checked_add_signed(offset))
        .ok_or_else(|| HarvesterError::parse(format!("MJD {mjd}"), "out of calendar range"))
}

/// Build a date from separate year, month and day values.
pub fn ymd_to_date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        HarvesterError::parse(
            format!("date {year:04}-{month:02}-{day:02}"),
            "not a calendar date",
        )
    })
}

/// Parse an ISO `YYYY-MM-DD` date as found in bulletin XML.
pub fn parse_iso_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|e| HarvesterError::parse(format!("date '{text}'"), e.to_string()))
}

/// Parse the leading `YYYY MM DD` columns of a bulletin table row.
pub fn parse_table_date(line: &str) -> Result<NaiveDate> {
    let fields: Vec<&str> = line.split_whitespace().take(3).collect();
    let [year, month, day] = fields.as_slice() else {
        return Err(HarvesterError::parse(
            format!("table row '{line}'"),
            "expected year, month and day columns",
        ));
    };

    let bad_row = |_| HarvesterError::parse(format!("table row '{line}'"), "non-numeric date column");
    ymd_to_date(
        year.parse().map_err(bad_row)?,
        month.parse().map_err(bad_row)?,
        day.parse().map_err(bad_row)?,
    )
}
