//! Metadata archives.
//!
//! The synchronizer only needs two things from an archive: the highest index
//! already recorded for a product type, and a way to add a record. Records
//! are never updated or removed.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{HarvesterError, Result};
use crate::types::{BulletinIndex, MetadataRecord};

/// Store of bulletin metadata records.
pub trait Archive {
    /// Highest index recorded for `product_type`, if any.
    fn latest_index(&self, product_type: &str) -> Result<Option<BulletinIndex>>;

    /// Add a record. A second record for the same product type and index is
    /// rejected.
    fn create(&mut self, record: MetadataRecord) -> Result<()>;
}

fn latest_in<'a>(
    records: impl Iterator<Item = &'a MetadataRecord>,
    product_type: &str,
) -> Option<BulletinIndex> {
    records
        .filter(|r| r.core.product_type == product_type)
        .map(|r| r.iers)
        .max()
}

fn ensure_new(records: &[MetadataRecord], record: &MetadataRecord) -> Result<()> {
    let duplicate = records
        .iter()
        .any(|r| r.core.product_type == record.core.product_type && r.iers == record.iers);
    if duplicate {
        return Err(HarvesterError::Archive(format!(
            "{} {} is already archived",
            record.core.product_type, record.iers
        )));
    }
    Ok(())
}

/// In-process archive.
#[derive(Debug, Default, Clone)]
pub struct MemoryArchive {
    records: Vec<MetadataRecord>,
}

impl MemoryArchive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive pre-filled with `records`.
    #[must_use]
    pub fn with_records(records: Vec<MetadataRecord>) -> Self {
        Self { records }
    }

    /// Records in creation order.
    #[must_use]
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }
}

impl Archive for MemoryArchive {
    fn latest_index(&self, product_type: &str) -> Result<Option<BulletinIndex>> {
        Ok(latest_in(self.records.iter(), product_type))
    }

    fn create(&mut self, record: MetadataRecord) -> Result<()> {
        ensure_new(&self.records, &record)?;
        self.records.push(record);
        Ok(())
    }
}

/// Archive kept in a JSON Lines file, one record per line.
///
/// The file is read once on open; each new record is appended to it.
#[derive(Debug)]
pub struct JsonLinesArchive {
    path: PathBuf,
    records: Vec<MetadataRecord>,
}

impl JsonLinesArchive {
    /// Open the archive at `path`, creating parent directories and starting
    /// empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let records = if path.exists() {
            Self::load(&path)?
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            Vec::new()
        };

        tracing::debug!(path = %path.display(), records = records.len(), "Opened archive");
        Ok(Self { path, records })
    }

    fn load(path: &Path) -> Result<Vec<MetadataRecord>> {
        let reader = BufReader::new(File::open(path)?);
        let mut records = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line).map_err(|e| {
                HarvesterError::Archive(format!("{}:{}: {e}", path.display(), number + 1))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records in file order.
    #[must_use]
    pub fn records(&self) -> &[MetadataRecord] {
        &self.records
    }
}

impl Archive for JsonLinesArchive {
    fn latest_index(&self, product_type: &str) -> Result<Option<BulletinIndex>> {
        Ok(latest_in(self.records.iter(), product_type))
    }

    fn create(&mut self, record: MetadataRecord) -> Result<()> {
        ensure_new(&self.records, &record)?;

        let line = serde_json::to_string(&record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;

        self.records.push(record);
        Ok(())
    }
}
