//! Core data types for the harvester.
//!
//! These types describe IERS bulletin families, their position in the
//! published sequence and the metadata record produced for each document.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{HarvesterError, Result};

/// The four IERS bulletin series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    /// Bulletin A: weekly rapid service and predictions.
    #[serde(rename = "IERS_A")]
    A,

    /// Bulletin B: monthly final values.
    #[serde(rename = "IERS_B")]
    B,

    /// Bulletin C: leap second announcements.
    #[serde(rename = "IERS_C")]
    C,

    /// Bulletin D: DUT1 announcements.
    #[serde(rename = "IERS_D")]
    D,
}

impl Family {
    /// All families, in synchronization order.
    pub const ALL: [Family; 4] = [Family::A, Family::B, Family::C, Family::D];

    /// Product type identifier used by the archive.
    #[must_use]
    pub fn product_type(&self) -> &'static str {
        match self {
            Self::A => "IERS_A",
            Self::B => "IERS_B",
            Self::C => "IERS_C",
            Self::D => "IERS_D",
        }
    }

    /// Filename prefix of the family's documents.
    #[must_use]
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::A => "bulletina",
            Self::B => "bulletinb",
            Self::C => "bulletinc",
            Self::D => "bulletind",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.product_type())
    }
}

impl FromStr for Family {
    type Err = HarvesterError;

    /// Accepts `A`, `a`, `IERS_A` or `iers_a`.
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.strip_prefix("IERS_").unwrap_or(upper.as_str()) {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            _ => Err(HarvesterError::InvalidInput(format!(
                "unknown bulletin family '{s}', expected one of A, B, C, D"
            ))),
        }
    }
}

/// Physical encoding of a bulletin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Freeform text (`.txt`).
    Text,

    /// Machine readable XML (`.xml`).
    #[default]
    Xml,
}

impl Encoding {
    /// File extension, with leading dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => ".txt",
            Self::Xml => ".xml",
        }
    }

    /// Encoding for a physical file name, if its extension is known.
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".txt") {
            Some(Self::Text)
        } else if name.ends_with(".xml") {
            Some(Self::Xml)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Xml => "xml",
        }
    }
}

impl FromStr for Encoding {
    type Err = HarvesterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "xml" => Ok(Self::Xml),
            _ => Err(HarvesterError::Config(format!(
                "unsupported encoding '{s}', expected 'text' or 'xml'"
            ))),
        }
    }
}

/// Position of a document within its family.
///
/// Bulletin A is numbered per volume; the other families use a single
/// running number and leave `volume` empty. Ordering compares the volume
/// first, then the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BulletinIndex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u32>,
    pub number: u32,
}

impl BulletinIndex {
    /// Index of a family with a single running number.
    #[must_use]
    pub const fn number(number: u32) -> Self {
        Self {
            volume: None,
            number,
        }
    }

    /// Index of a volume-numbered family.
    #[must_use]
    pub const fn volume(volume: u32, number: u32) -> Self {
        Self {
            volume: Some(volume),
            number,
        }
    }
}

impl fmt::Display for BulletinIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.volume {
            Some(volume) => write!(f, "{volume}/{:03}", self.number),
            None => write!(f, "{:03}", self.number),
        }
    }
}

/// Raw groups captured by a family's filename grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameFields {
    /// Lower-case Roman volume (Bulletin A only).
    pub volume: Option<String>,
    /// Three digit document number.
    pub number: String,
}

/// Dates read from a bulletin's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    pub creation_date: NaiveDate,
    pub validity_start: NaiveDate,
    /// Exclusive end; absent for open-ended bulletins (C and D).
    pub validity_stop: Option<NaiveDate>,
}

/// Family independent properties of an archived document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,
    #[serde(default)]
    pub active: bool,
    pub product_type: String,
    pub product_name: String,
    pub physical_name: String,
    pub remote_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_stop: Option<NaiveDate>,
}

/// Metadata record for one bulletin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub core: CoreProperties,
    pub iers: BulletinIndex,
}

impl MetadataRecord {
    /// Copy content-derived dates into the core properties.
    pub fn apply_validity(&mut self, validity: Validity) {
        self.core.creation_date = Some(validity.creation_date);
        self.core.validity_start = Some(validity.validity_start);
        self.core.validity_stop = validity.validity_stop;
    }

    /// Check the ordering of the content-derived dates.
    ///
    /// A validity stop must lie after the start. A creation date after the
    /// validity start is normal for bulletins that report past data, so it
    /// is only logged.
    pub fn validate(&self) -> Result<()> {
        let core = &self.core;
        if let (Some(start), Some(stop)) = (core.validity_start, core.validity_stop) {
            if stop <= start {
                return Err(HarvesterError::parse(
                    core.physical_name.clone(),
                    format!("validity stop {stop} is not after validity start {start}"),
                ));
            }
        }
        if let (Some(created), Some(start)) = (core.creation_date, core.validity_start) {
            if created > start {
                tracing::debug!(
                    name = %core.physical_name,
                    %created,
                    %start,
                    "document created after its validity start"
                );
            }
        }
        Ok(())
    }

    /// Generate an identifier and mark the record active, ready for the archive.
    pub fn activate(&mut self) {
        self.core.uuid = Some(Uuid::new_v4());
        self.core.active = true;
    }
}
