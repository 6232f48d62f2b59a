//! Raw bulletin content.
//!
//! Text bulletins are handed to the extractors as their non-empty lines,
//! trimmed. XML bulletins are handed over as source text and parsed by the
//! caller, since a roxmltree document borrows from its input.

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Split text into trimmed, non-empty lines.
///
/// # Examples
/// ```
/// use iers_harvester::document::content_lines;
///
/// let lines = content_lines("  first  \n\n   \nsecond\r\n");
/// assert_eq!(lines, vec!["first", "second"]);
/// ```
#[must_use]
pub fn content_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a document from disk.
///
/// Bulletins are mostly ASCII, but older French editions are Latin-1; bytes
/// that are not valid UTF-8 are replaced rather than rejected.
pub fn read_document(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    Ok(bytes_to_string(&bytes, path))
}

/// Decode document bytes, logging when replacement was needed.
pub fn bytes_to_string(bytes: &[u8], origin: &Path) -> String {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!(
                path = %origin.display(),
                "document is not valid UTF-8, replacing invalid bytes"
            );
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
