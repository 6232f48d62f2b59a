//! IERS Bulletin C: announcements of leap seconds in UTC.
//!
//! A Bulletin C states the UTC-TAI offset in force from a given date until
//! further notice, so only a validity start is recorded.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::Node;

use super::scan::{after_last_comma, after_prefix, before_comma, find_containing, xml_date};
use super::BulletinFormat;
use crate::dates::{parse_named_date, FieldOrder};
use crate::error::{HarvesterError, Result};
use crate::types::{BulletinIndex, Family, Validity};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bulletinc-(?P<number>\d{3})").expect("valid regex"));

pub struct BulletinC;

impl BulletinFormat for BulletinC {
    fn family(&self) -> Family {
        Family::C
    }

    fn filename_pattern(&self) -> &Regex {
        &FILENAME_PATTERN
    }

    fn catalog_id(&self) -> u32 {
        16
    }

    fn initial_index(&self) -> BulletinIndex {
        BulletinIndex::number(36)
    }

    fn known_gaps(&self) -> &[BulletinIndex] {
        &[]
    }

    fn parse_text(&self, lines: &[String], context: &str) -> Result<Validity> {
        let byline = &lines[find_containing(lines, "Paris, ", context)?];
        let creation_date = parse_named_date(after_last_comma(byline), FieldOrder::DayMonthYear)?;

        let from = after_prefix(lines, "from ")
            .ok_or_else(|| HarvesterError::parse(context, "no line starting with 'from '"))?;
        let validity_start = parse_named_date(before_comma(from), FieldOrder::YearMonthDay)?;

        Ok(Validity {
            creation_date,
            validity_start,
            validity_stop: None,
        })
    }

    fn parse_xml(&self, root: Node<'_, '_>, context: &str) -> Result<Validity> {
        Ok(Validity {
            creation_date: xml_date(root, "data/date", context)?,
            validity_start: xml_date(root, "data/UT/startDate", context)?,
            validity_stop: None,
        })
    }
}
