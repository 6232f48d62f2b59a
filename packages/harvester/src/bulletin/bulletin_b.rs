//! IERS Bulletin B: monthly final values of Earth orientation parameters.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::Node;

use super::scan::{find_containing, find_exact, line_at, next_day};
use super::{time_series_validity, BulletinFormat};
use crate::dates::{parse_named_date, parse_table_date, FieldOrder};
use crate::error::Result;
use crate::types::{BulletinIndex, Family, Validity};

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^bulletinb-(?P<number>\d{3})").expect("valid regex"));

const FINAL_VALUES: &str = "Final values";
const POLE_OFFSETS: &str = "CELESTIAL POLE OFFSETS";

pub struct BulletinB;

impl BulletinFormat for BulletinB {
    fn family(&self) -> Family {
        Family::B
    }

    fn filename_pattern(&self) -> &Regex {
        &FILENAME_PATTERN
    }

    fn catalog_id(&self) -> u32 {
        207
    }

    fn initial_index(&self) -> BulletinIndex {
        BulletinIndex::number(252)
    }

    fn known_gaps(&self) -> &[BulletinIndex] {
        &[]
    }

    fn parse_text(&self, lines: &[String], context: &str) -> Result<Validity> {
        let creation_date =
            parse_named_date(line_at(lines, Some(1), context)?, FieldOrder::DayMonthYear)?;

        // Column header sits between the section title and the first row.
        let section = find_exact(lines, FINAL_VALUES, context)?;
        let validity_start = parse_table_date(line_at(lines, Some(section + 2), context)?)?;

        let next_section = find_containing(lines, POLE_OFFSETS, context)?;
        let last_row = line_at(lines, next_section.checked_sub(1), context)?;
        let validity_stop = next_day(parse_table_date(last_row)?, context)?;

        Ok(Validity {
            creation_date,
            validity_start,
            validity_stop: Some(validity_stop),
        })
    }

    fn parse_xml(&self, root: Node<'_, '_>, context: &str) -> Result<Validity> {
        time_series_validity(root, context)
    }
}
