//! Anchor scanning helpers shared by the bulletin extractors.

use chrono::NaiveDate;
use roxmltree::Node;

use crate::dates::{parse_iso_date, ymd_to_date};
use crate::error::{HarvesterError, Result};
use crate::xml::required_text;

/// Position of the first line equal to `anchor`.
pub(super) fn find_exact(lines: &[String], anchor: &str, context: &str) -> Result<usize> {
    lines
        .iter()
        .position(|line| line == anchor)
        .ok_or_else(|| HarvesterError::parse(context, format!("no line '{anchor}'")))
}

/// Position of the first line containing `anchor`.
pub(super) fn find_containing(lines: &[String], anchor: &str, context: &str) -> Result<usize> {
    lines
        .iter()
        .position(|line| line.contains(anchor))
        .ok_or_else(|| HarvesterError::parse(context, format!("no line containing '{anchor}'")))
}

/// Remainder of the first line starting with `prefix`.
pub(super) fn after_prefix<'a>(lines: &'a [String], prefix: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| line.strip_prefix(prefix))
}

/// Line at `index`, relative offsets included.
pub(super) fn line_at<'a>(
    lines: &'a [String],
    index: Option<usize>,
    context: &str,
) -> Result<&'a str> {
    index
        .and_then(|i| lines.get(i))
        .map(String::as_str)
        .ok_or_else(|| HarvesterError::parse(context, "document ends before the expected line"))
}

/// Text before the first comma.
pub(super) fn before_comma(text: &str) -> &str {
    text.split(',').next().unwrap_or(text).trim()
}

/// Text after the last comma.
pub(super) fn after_last_comma(text: &str) -> &str {
    text.rsplit(',').next().unwrap_or(text).trim()
}

/// Day after `date`, used to turn an inclusive last day into an exclusive stop.
pub(super) fn next_day(date: NaiveDate, context: &str) -> Result<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| HarvesterError::parse(context, format!("no day after {date}")))
}

/// ISO date stored as the text of the element at `path`.
pub(super) fn xml_date(node: Node<'_, '_>, path: &str, context: &str) -> Result<NaiveDate> {
    parse_iso_date(&required_text(node, path, context)?)
}

/// Date of a `time` element with `dateYear`, `dateMonth` and `dateDay` children.
pub(super) fn xml_time(time: Node<'_, '_>, context: &str) -> Result<NaiveDate> {
    let field = |name: &str| -> Result<u32> {
        let text = required_text(time, name, context)?;
        text.parse()
            .map_err(|_| HarvesterError::parse(context, format!("invalid {name} '{text}'")))
    };

    let year = field("dateYear")?;
    let year = i32::try_from(year)
        .map_err(|_| HarvesterError::parse(context, format!("invalid dateYear '{year}'")))?;
    ymd_to_date(year, field("dateMonth")?, field("dateDay")?)
}
