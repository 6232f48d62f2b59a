//! IERS Bulletin D: announcements of the DUT1 value broadcast with time signals.
//!
//! Bulletin D has been issued in English and in French, with the date line
//! and the "From the" clause laid out differently over the years. Both
//! layouts are recognised.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::Node;

use super::scan::{after_last_comma, after_prefix, before_comma, line_at, xml_date};
use super::BulletinFormat;
use crate::dates::{parse_named_date, FieldOrder};
use crate::error::{HarvesterError, Result};
use crate::types::{BulletinIndex, Family, Validity};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bulletind-(?P<number>\d{3})").expect("valid regex"));

pub struct BulletinD;

impl BulletinD {
    /// Issue date from `Paris, 7 January 2025` or `Paris le 7 janvier 2025`.
    fn creation_date(lines: &[String], context: &str) -> Result<chrono::NaiveDate> {
        if let Some(line) = lines.iter().find(|line| line.contains("Paris,")) {
            return parse_named_date(after_last_comma(line), FieldOrder::DayMonthYear);
        }

        let date = lines
            .iter()
            .find_map(|line| line.split_once("Paris le ").map(|(_, date)| date))
            .ok_or_else(|| {
                HarvesterError::parse(context, "no line containing 'Paris,' or 'Paris le '")
            })?;
        parse_named_date(date.trim(), FieldOrder::DayMonthYear)
    }

    /// Start date from a `From the` line followed by the date, or from a
    /// single `From the 1 March 2025, 0h UTC` line.
    fn validity_start(lines: &[String], context: &str) -> Result<chrono::NaiveDate> {
        let clause = match lines.iter().position(|line| line == "From the") {
            Some(index) => line_at(lines, Some(index + 1), context)?,
            None => after_prefix(lines, "From the ").ok_or_else(|| {
                HarvesterError::parse(context, "no line 'From the' or starting with 'From the '")
            })?,
        };
        parse_named_date(before_comma(clause), FieldOrder::DayMonthYear)
    }
}

impl BulletinFormat for BulletinD {
    fn family(&self) -> Family {
        Family::D
    }

    fn filename_pattern(&self) -> &Regex {
        &FILENAME_PATTERN
    }

    fn catalog_id(&self) -> u32 {
        17
    }

    fn initial_index(&self) -> BulletinIndex {
        BulletinIndex::number(85)
    }

    fn known_gaps(&self) -> &[BulletinIndex] {
        &[]
    }

    fn parse_text(&self, lines: &[String], context: &str) -> Result<Validity> {
        Ok(Validity {
            creation_date: Self::creation_date(lines, context)?,
            validity_start: Self::validity_start(lines, context)?,
            validity_stop: None,
        })
    }

    fn parse_xml(&self, root: Node<'_, '_>, context: &str) -> Result<Validity> {
        Ok(Validity {
            creation_date: xml_date(root, "data/date", context)?,
            validity_start: xml_date(root, "data/startDate", context)?,
            validity_stop: None,
        })
    }
}
