//! IERS Bulletin A: weekly rapid service and predictions.
//!
//! Bulletin A is numbered per yearly volume (`bulletina-xxxviii-001`). A
//! volume holds at most 53 issues; the 53rd only exists in years with 53
//! publication Thursdays, so a missing 53rd issue never ends the sequence.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::Node;

use super::scan::{find_exact, line_at, next_day};
use super::{time_series_validity, BulletinFormat};
use crate::dates::{mjd_to_date, parse_named_date, parse_table_date, FieldOrder};
use crate::error::{HarvesterError, Result};
use crate::roman;
use crate::types::{BulletinIndex, Encoding, Family, Validity};

/// Highest issue number within one volume.
pub const ISSUES_PER_VOLUME: u32 = 53;

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^bulletina-(?P<volume>[ivxlcdm]+)-(?P<number>\d{3})").expect("valid regex")
});

#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static ISSUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Vol\.\s+(?P<volume>[IVXLCDM]+)\s+No\.\s+(?P<number>\d+)").expect("valid regex")
});

const KNOWN_GAPS: [BulletinIndex; 1] = [BulletinIndex::volume(18, 5)];

/// Section whose first data row carries the first valid MJD.
const POLE_OFFSET_HEADER: &str = "CELESTIAL POLE OFFSET SERIES:";

/// Sentence that directly follows the last prediction row.
const PREDICTIONS_FOOTER: &str = "These predictions are based on all announced leap seconds.";

/// Line (0-based, blank lines removed) holding the issue date.
const DATE_LINE: usize = 6;

/// The issue date occupies the left part of the date line; volume and
/// number are printed on the right.
const DATE_WIDTH: usize = 40;

pub struct BulletinA;

impl BulletinA {
    /// Compare the `Vol. N No. M` stamp of the date line with the index in
    /// the file name. Documents without a stamp, or analyzed under a name
    /// that is not a Bulletin A file name, are not checked.
    fn check_issue(&self, date_row: &str, context: &str) -> Result<()> {
        let (Some(captures), Ok(expected)) = (ISSUE_PATTERN.captures(date_row), self.index_of(context))
        else {
            return Ok(());
        };

        let number = captures["number"].parse().map_err(|_| {
            HarvesterError::parse(context, format!("invalid issue number in '{date_row}'"))
        })?;
        let found = BulletinIndex::volume(roman::to_integer(&captures["volume"]), number);

        if found == expected {
            Ok(())
        } else {
            Err(HarvesterError::parse(
                context,
                format!("document is issue {found}, file name says {expected}"),
            ))
        }
    }
}

impl BulletinFormat for BulletinA {
    fn family(&self) -> Family {
        Family::A
    }

    fn filename_pattern(&self) -> &Regex {
        &FILENAME_PATTERN
    }

    fn catalog_id(&self) -> u32 {
        6
    }

    fn initial_index(&self) -> BulletinIndex {
        BulletinIndex::volume(12, 1)
    }

    fn known_gaps(&self) -> &[BulletinIndex] {
        &KNOWN_GAPS
    }

    fn format_name(&self, encoding: Encoding, index: BulletinIndex) -> String {
        debug_assert!(
            index.volume.is_some_and(|v| v > 0),
            "Bulletin A index {index} has no volume"
        );
        let volume = roman::from_integer(index.volume.unwrap_or_default()).to_lowercase();
        format!(
            "{}-{volume}-{:03}{}",
            self.family().file_prefix(),
            index.number,
            encoding.extension()
        )
    }

    fn successor(&self, index: BulletinIndex) -> BulletinIndex {
        let volume = index.volume.unwrap_or_default();
        if index.number >= ISSUES_PER_VOLUME {
            BulletinIndex::volume(volume + 1, 1)
        } else {
            BulletinIndex::volume(volume, index.number + 1)
        }
    }

    fn is_known_gap(&self, index: BulletinIndex) -> bool {
        index.number == ISSUES_PER_VOLUME || KNOWN_GAPS.contains(&index)
    }

    fn parse_text(&self, lines: &[String], context: &str) -> Result<Validity> {
        let date_row = line_at(lines, Some(DATE_LINE), context)?;
        let date_text: String = date_row.chars().take(DATE_WIDTH).collect();
        let creation_date = parse_named_date(date_text.trim(), FieldOrder::DayMonthYear)?;
        self.check_issue(date_row, context)?;

        let header = find_exact(lines, POLE_OFFSET_HEADER, context)?;
        let first_row = line_at(lines, Some(header + 4), context)?;
        let mjd = first_row
            .split_whitespace()
            .next()
            .and_then(|field| field.parse::<i64>().ok())
            .ok_or_else(|| {
                HarvesterError::parse(context, format!("no MJD in pole offset row '{first_row}'"))
            })?;
        let validity_start = mjd_to_date(mjd)?;

        let footer = find_exact(lines, PREDICTIONS_FOOTER, context)?;
        let last_row = line_at(lines, footer.checked_sub(1), context)?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::Path;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const TEXT: &str = "
**********************************************************************
*                                                                    *
*                   I E R S   B U L L E T I N - A                    *
*                                                                    *
*           Rapid Service/Prediction of Earth Orientation            *
**********************************************************************
2 January 2025                                   Vol. XXXVIII No. 001

         MJD      x(arcsec)   y(arcsec)   UT1-UTC(sec)
2025  1  3  60678       0.1118      0.3071     0.04382
2026  1  2  61042       0.0813      0.2957    -0.00520
These predictions are based on all announced leap seconds.

CELESTIAL POLE OFFSET SERIES:
NEOS Celestial Pole Offset Series
MJD      dpsi    deps
(msec. of arc)
60673   -113.68    -8.42
60674   -113.71    -8.38
";

    #[test]
    fn test_match_filename() {
        let fields = BulletinA.match_filename("bulletina-xxxviii-001.txt").unwrap();
        assert_eq!(fields.volume.as_deref(), Some("xxxviii"));
        assert_eq!(fields.number, "001");
        assert!(BulletinA.match_filename("bulletinb-001.txt").is_none());
        assert!(BulletinA.match_filename("bulletina-38-001.txt").is_none());
    }

    #[test]
    fn test_match_filename_volume_forty_and_above() {
        let fields = BulletinA.match_filename("bulletina-xl-010.xml").unwrap();
        assert_eq!(fields.volume.as_deref(), Some("xl"));
    }

    #[test]
    fn test_identify() {
        assert!(BulletinA.identify(&[Path::new("/data/bulletina-xviii-004.xml")]));
        assert!(BulletinA.identify(&[Path::new("bulletina-xviii-004.txt")]));
        assert!(!BulletinA.identify(&[Path::new("bulletina-xviii-04.txt")]));
        assert!(!BulletinA.identify(&[Path::new("bulletina-XVIII-004.txt")]));
    }

    #[test]
    fn test_index_of() {
        assert_eq!(
            BulletinA.index_of("bulletina-xviii-004.xml").unwrap(),
            BulletinIndex::volume(18, 4)
        );
        assert!(BulletinA.index_of("bulletina.xml").is_err());
    }

    #[test]
    fn test_format_name() {
        assert_eq!(
            BulletinA.format_name(Encoding::Xml, BulletinIndex::volume(18, 5)),
            "bulletina-xviii-005.xml"
        );
        assert_eq!(
            BulletinA.format_name(Encoding::Text, BulletinIndex::volume(38, 52)),
            "bulletina-xxxviii-052.txt"
        );
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "has no volume")]
    fn test_format_name_requires_volume() {
        BulletinA.format_name(Encoding::Xml, BulletinIndex::number(1));
    }

    #[test]
    fn test_index_of_rejects_missing_volume() {
        assert!(BulletinA.index_of("bulletina--001.xml").is_err());
    }

    #[test]
    fn test_format_name_roundtrip() {
        for volume in [1, 12, 18, 38, 40, 49, 99] {
            for number in [1, 9, 52, 53] {
                let index = BulletinIndex::volume(volume, number);
                for encoding in [Encoding::Text, Encoding::Xml] {
                    let name = BulletinA.format_name(encoding, index);
                    assert_eq!(BulletinA.index_of(&name).unwrap(), index, "{name}");
                }
            }
        }
    }

    #[test]
    fn test_successor_wraps_after_last_issue() {
        assert_eq!(
            BulletinA.successor(BulletinIndex::volume(18, 52)),
            BulletinIndex::volume(18, 53)
        );
        assert_eq!(
            BulletinA.successor(BulletinIndex::volume(18, 53)),
            BulletinIndex::volume(19, 1)
        );
    }

    #[test]
    fn test_is_known_gap() {
        assert!(BulletinA.is_known_gap(BulletinIndex::volume(18, 53)));
        assert!(BulletinA.is_known_gap(BulletinIndex::volume(37, 53)));
        assert!(BulletinA.is_known_gap(BulletinIndex::volume(18, 5)));
        assert!(!BulletinA.is_known_gap(BulletinIndex::volume(18, 6)));
        assert!(!BulletinA.is_known_gap(BulletinIndex::volume(19, 5)));
    }

    #[test]
    fn test_parse_text() {
        let validity = BulletinA
            .analyze_content("bulletina-xxxviii-001.txt", TEXT)
            .unwrap();
        assert_eq!(validity.creation_date, date(2025, 1, 2));
        assert_eq!(validity.validity_start, date(2024, 12, 29));
        assert_eq!(validity.validity_stop, Some(date(2026, 1, 3)));
    }

    #[test]
    fn test_parse_text_missing_pole_offsets() {
        let text = TEXT.replace(POLE_OFFSET_HEADER, "CELESTIAL POLE OFFSETS");
        let err = BulletinA
            .analyze_content("bulletina-xxxviii-001.txt", &text)
            .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_parse_text_missing_footer() {
        let text = TEXT.replace(PREDICTIONS_FOOTER, "");
        assert!(BulletinA
            .analyze_content("bulletina-xxxviii-001.txt", &text)
            .is_err());
    }

    #[test]
    fn test_parse_text_issue_mismatch() {
        let err = BulletinA
            .analyze_content("bulletina-xxxviii-002.txt", TEXT)
            .unwrap_err();
        assert!(err.is_parse_error());
        assert!(err.to_string().contains("38/001"));
    }

    #[test]
    fn test_parse_text_short_document() {
        let err = BulletinA
            .analyze_content("bulletina-xxxviii-001.txt", "IERS\nBULLETIN A\n")
            .unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_parse_xml_three_times() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<EOP xmlns="http://www.iers.org/2003/schema/iers">
  <version><date>2025-01-02</date></version>
  <data>
    <timeSeries>
      <time><dateYear>2025</dateYear><dateMonth>1</dateMonth><dateDay>3</dateDay></time>
      <time><dateYear>2025</dateYear><dateMonth>1</dateMonth><dateDay>4</dateDay></time>
      <time><dateYear>2025</dateYear><dateMonth>1</dateMonth><dateDay>31</dateDay></time>
    </timeSeries>
  </data>
</EOP>"#;
        let validity = BulletinA
            .analyze_content("bulletina-xxxviii-001.xml", xml)
            .unwrap();
        assert_eq!(validity.creation_date, date(2025, 1, 2));
        assert_eq!(validity.validity_start, date(2025, 1, 3));
        assert_eq!(validity.validity_stop, Some(date(2025, 2, 1)));
    }

    #[test]
    fn test_parse_xml_without_time_series() {
        let xml = r#"<EOP xmlns="http://www.iers.org/2003/schema/iers">
  <version><date>2025-01-02</date></version>
  <data><timeSeries/></data>
</EOP>"#;
        let err = BulletinA
            .analyze_content("bulletina-xxxviii-001.xml", xml)
            .unwrap_err();
        assert!(matches!(err, HarvesterError::MissingElement { .. }));
    }
}
