//! Bulletin formats.
//!
//! Each IERS bulletin family has its own filename grammar, numbering scheme
//! and document layout. The common contract is the [`BulletinFormat`] trait;
//! [`BulletinA`], [`BulletinB`], [`BulletinC`] and [`BulletinD`] implement the
//! family specific parts and the [`BulletinRegistry`] maps a [`Family`] to its
//! implementation.

mod bulletin_a;
mod bulletin_b;
mod bulletin_c;
mod bulletin_d;
mod registry;
mod scan;

use std::path::Path;

use regex::{Captures, Regex};
use roxmltree::{Document, Node};

use crate::config::{DATACENTER_URL, HASH_TYPE, XML_CATALOG};
use crate::document::{content_lines, read_document};
use crate::error::{HarvesterError, Result};
use crate::roman;
use crate::types::{
    BulletinIndex, CoreProperties, Encoding, Family, FilenameFields, MetadataRecord, Validity,
};

pub use bulletin_a::{BulletinA, ISSUES_PER_VOLUME};
pub use bulletin_b::BulletinB;
pub use bulletin_c::BulletinC;
pub use bulletin_d::BulletinD;
pub use registry::{create_bulletin_registry, BulletinRegistry};

/// Final path component of a file name or path.
fn basename(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(name)
}

/// Captures of `pattern` if it covers `name` entirely, or up to an
/// extension dot when `allow_extension` is set.
fn whole_name_captures<'n>(
    pattern: &Regex,
    name: &'n str,
    allow_extension: bool,
) -> Option<Captures<'n>> {
    let captures = pattern.captures(name)?;
    let rest = &name[captures.get(0)?.end()..];
    (rest.is_empty() || (allow_extension && rest.starts_with('.'))).then_some(captures)
}

/// Behaviour shared by all bulletin families.
///
/// Implementors supply the family constants and the two content
/// extractors. Filename handling, URL construction, index arithmetic and
/// metadata assembly are provided on top of those.
pub trait BulletinFormat: Send + Sync {
    /// Family this format handles.
    fn family(&self) -> Family;

    /// Filename grammar without extension, anchored at the start.
    ///
    /// Captures `number`, and `volume` for volume-numbered families.
    fn filename_pattern(&self) -> &Regex;

    /// Numeric catalog id of the family's text bulletins on the data center.
    fn catalog_id(&self) -> u32;

    /// Index to start from when the archive has no document of this family.
    fn initial_index(&self) -> BulletinIndex;

    /// Indices that are permanently missing from the remote catalog.
    fn known_gaps(&self) -> &[BulletinIndex];

    /// Extract dates from the trimmed, non-empty lines of a text bulletin.
    fn parse_text(&self, lines: &[String], context: &str) -> Result<Validity>;

    /// Extract dates from the root element of an XML bulletin.
    fn parse_xml(&self, root: Node<'_, '_>, context: &str) -> Result<Validity>;

    /// Encodings this family is published in.
    fn encodings(&self) -> &[Encoding] {
        &[Encoding::Text, Encoding::Xml]
    }

    fn product_type(&self) -> &'static str {
        self.family().product_type()
    }

    /// Content hash algorithm used for archived files.
    fn hash_type(&self) -> &'static str {
        HASH_TYPE
    }

    /// Whether archived files are wrapped in a directory.
    fn use_enclosing_directory(&self) -> bool {
        false
    }

    /// Archive location of a record: one flat collection per product type.
    fn archive_path(&self, _record: &MetadataRecord) -> &'static str {
        self.product_type()
    }

    /// Apply the filename grammar to the base name of `name`.
    ///
    /// The grammar must run up to the end of the name or up to the
    /// extension, so `bulletinb-1000.xml` is not read as number 100.
    fn match_filename(&self, name: &str) -> Option<FilenameFields> {
        let captures = whole_name_captures(self.filename_pattern(), basename(name), true)?;
        Some(FilenameFields {
            volume: captures.name("volume").map(|m| m.as_str().to_string()),
            number: captures.name("number")?.as_str().to_string(),
        })
    }

    /// True if `paths` is a single file whose name is exactly the grammar
    /// followed by one of the family's extensions.
    fn identify(&self, paths: &[&Path]) -> bool {
        let [path] = paths else {
            return false;
        };
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };

        self.encodings()
            .iter()
            .any(|encoding| match name.strip_suffix(encoding.extension()) {
                Some(stem) => whole_name_captures(self.filename_pattern(), stem, false).is_some(),
                None => false,
            })
    }

    /// Remote catalog URL of a document on the public data center.
    fn build_remote_url(&self, physical_name: &str) -> Result<String> {
        self.remote_url(DATACENTER_URL, physical_name)
    }

    /// Remote catalog URL of a document below `base_url`.
    ///
    /// XML bulletins of every family share one directory; text bulletins
    /// live in a directory named after the family's catalog id.
    fn remote_url(&self, base_url: &str, physical_name: &str) -> Result<String> {
        let base_url = base_url.trim_end_matches('/');
        match Encoding::from_file_name(physical_name) {
            Some(Encoding::Xml) => Ok(format!("{base_url}/{XML_CATALOG}/{physical_name}")),
            Some(Encoding::Text) => Ok(format!("{base_url}/{}/{physical_name}", self.catalog_id())),
            None => Err(HarvesterError::InvalidInput(format!(
                "no remote catalog for '{physical_name}', expected a .txt or .xml file"
            ))),
        }
    }

    /// Convert captured filename groups to an index.
    fn index_from_fields(&self, fields: &FilenameFields, context: &str) -> Result<BulletinIndex> {
        let number = fields.number.parse().map_err(|_| {
            HarvesterError::parse(context, format!("invalid number '{}'", fields.number))
        })?;
        Ok(BulletinIndex {
            volume: fields.volume.as_deref().map(roman::to_integer),
            number,
        })
    }

    /// Index encoded in a file name.
    fn index_of(&self, physical_name: &str) -> Result<BulletinIndex> {
        let fields = self.match_filename(physical_name).ok_or_else(|| {
            HarvesterError::parse(
                physical_name,
                format!("does not match the {} filename pattern", self.product_type()),
            )
        })?;
        self.index_from_fields(&fields, physical_name)
    }

    /// File name of the document at `index` in the given encoding.
    fn format_name(&self, encoding: Encoding, index: BulletinIndex) -> String {
        format!(
            "{}-{:03}{}",
            self.family().file_prefix(),
            index.number,
            encoding.extension()
        )
    }

    /// Next index in publication order.
    fn successor(&self, index: BulletinIndex) -> BulletinIndex {
        BulletinIndex {
            number: index.number + 1,
            ..index
        }
    }

    /// True if a missing document at `index` does not end the sequence.
    fn is_known_gap(&self, index: BulletinIndex) -> bool {
        self.known_gaps().contains(&index)
    }

    /// Metadata record built from the file name alone.
    fn describe(&self, physical_name: &str) -> Result<MetadataRecord> {
        let physical_name = basename(physical_name);
        let iers = self.index_of(physical_name)?;
        let product_name = physical_name
            .rsplit_once('.')
            .map_or(physical_name, |(stem, _)| stem);

        Ok(MetadataRecord {
            core: CoreProperties {
                uuid: None,
                active: false,
                product_type: self.product_type().to_string(),
                product_name: product_name.to_string(),
                physical_name: physical_name.to_string(),
                remote_url: self.build_remote_url(physical_name)?,
                size: None,
                creation_date: None,
                validity_start: None,
                validity_stop: None,
            },
            iers,
        })
    }

    /// Extract validity dates from document content, choosing the extractor
    /// by the extension of `physical_name`.
    fn analyze_content(&self, physical_name: &str, content: &str) -> Result<Validity> {
        match Encoding::from_file_name(physical_name) {
            Some(Encoding::Text) => self.parse_text(&content_lines(content), physical_name),
            Some(Encoding::Xml) => {
                let doc = Document::parse(content)?;
                self.parse_xml(doc.root_element(), physical_name)
            }
            None => Err(HarvesterError::InvalidInput(format!(
                "cannot analyze '{physical_name}', expected a .txt or .xml file"
            ))),
        }
    }

    /// Build the metadata record of a local document.
    ///
    /// Filename-derived fields are always filled in. With
    /// `content_required` the document is read and its creation date and
    /// validity interval are extracted as well.
    ///
    /// # Arguments
    /// * `paths` - Exactly one path to the bulletin file
    /// * `content_required` - Whether to read the file and extract its dates
    ///
    /// # Returns
    /// Inactive metadata record without a UUID
    fn extract_metadata(&self, paths: &[&Path], content_required: bool) -> Result<MetadataRecord> {
        let [path] = paths else {
            return Err(HarvesterError::InvalidInput(format!(
                "expected exactly one path, got {}",
                paths.len()
            )));
        };
        let physical_name = path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            HarvesterError::InvalidInput(format!("'{}' has no file name", path.display()))
        })?;

        let mut record = self.describe(physical_name)?;

        if content_required {
            let content = read_document(path)?;
            let validity = self.analyze_content(physical_name, &content)?;
            record.apply_validity(validity);
            record.validate()?;
        }

        Ok(record)
    }
}

/// Validity of bulletins that carry a daily time series (A and B).
///
/// The creation date is `version/date`; the series runs from the first
/// `data/timeSeries/time` entry up to and including the last one.
fn time_series_validity(root: Node<'_, '_>, context: &str) -> Result<Validity> {
    let creation_date = scan::xml_date(root, "version/date", context)?;

    let times = crate::xml::find_all_by_path(root, "data/timeSeries/time");
    let (Some(first), Some(last)) = (times.first(), times.last()) else {
        return Err(HarvesterError::missing_element(
            "data/timeSeries/time",
            context,
        ));
    };

    let validity_start = scan::xml_time(*first, context)?;
    let validity_stop = scan::next_day(scan::xml_time(*last, context)?, context)?;

    Ok(Validity {
        creation_date,
        validity_start,
        validity_stop: Some(validity_stop),
    })
}
