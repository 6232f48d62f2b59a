//! Index-walk synchronization against the remote catalog.
//!
//! For every requested family the synchronizer starts just past the highest
//! index already archived, probes candidate file names one after another and
//! archives a record for each document found. A not-found answer ends the
//! family unless the index is a known gap.

use std::fs;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::archive::Archive;
use crate::bulletin::{BulletinFormat, BulletinRegistry};
use crate::catalog::{Catalog, Probe};
use crate::config::{ParseFailurePolicy, SyncConfig};
use crate::error::{HarvesterError, Result};
use crate::types::{BulletinIndex, Family, MetadataRecord};

/// What to synchronize.
///
/// `start`, `end` and `force` are accepted so callers can pass them through,
/// but any of them makes [`Synchronizer::run`] fail before doing work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncRequest {
    /// Families to walk; empty means every registered family.
    pub families: Vec<Family>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub force: bool,
}

impl SyncRequest {
    pub fn new(families: impl IntoIterator<Item = Family>) -> Self {
        Self {
            families: families.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Reject the options this harvester does not implement.
    pub fn ensure_supported(&self) -> Result<()> {
        if self.start.is_some() {
            return Err(HarvesterError::Unsupported(
                "synchronization from a start index".to_string(),
            ));
        }
        if self.end.is_some() {
            return Err(HarvesterError::Unsupported(
                "synchronization up to an end index".to_string(),
            ));
        }
        if self.force {
            return Err(HarvesterError::Unsupported(
                "forced re-synchronization".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of one family's walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyReport {
    pub family: Family,
    /// Indices archived during this pass, in order.
    pub created: Vec<BulletinIndex>,
    /// Known gaps passed over.
    pub skipped_gaps: Vec<BulletinIndex>,
    /// Found documents dropped because their content could not be parsed.
    pub skipped_unparseable: Vec<BulletinIndex>,
    /// First index the catalog did not have.
    pub stopped_at: BulletinIndex,
}

/// Outcome of a synchronization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub families: Vec<FamilyReport>,
}

impl SyncReport {
    /// Number of records archived over all families.
    #[must_use]
    pub fn total_created(&self) -> usize {
        self.families.iter().map(|f| f.created.len()).sum()
    }
}

/// Spaces successive requests at least `interval` apart.
#[derive(Debug)]
pub struct Throttle {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl Throttle {
    /// `None` disables waiting.
    pub fn new(interval: Option<Duration>) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Block until the next request may go out, then mark it sent.
    pub fn wait(&mut self) {
        if let (Some(interval), Some(last)) = (self.interval, self.last) {
            let elapsed = last.elapsed();
            if elapsed < interval {
                let delay = interval - elapsed;
                tracing::trace!(delay_ms = delay.as_millis() as u64, "Throttling");
                thread::sleep(delay);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// Walks the remote catalog and fills an archive.
pub struct Synchronizer<'r, C> {
    registry: &'r BulletinRegistry,
    catalog: C,
    config: SyncConfig,
}

impl<'r, C: Catalog> Synchronizer<'r, C> {
    pub fn new(registry: &'r BulletinRegistry, catalog: C, config: SyncConfig) -> Self {
        Self {
            registry,
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one synchronization pass.
    ///
    /// Families are walked in request order. Any error ends the whole pass;
    /// records archived before it are kept.
    ///
    /// # Arguments
    /// * `archive` - Archive queried for the latest index and filled with new records
    /// * `request` - Families to walk; `start`, `end` and `force` must be unset
    ///
    /// # Returns
    /// Per-family report of created, skipped and stopping indices
    pub fn run(&self, archive: &mut dyn Archive, request: &SyncRequest) -> Result<SyncReport> {
        request.ensure_supported()?;

        let families: Vec<Family> = if request.families.is_empty() {
            self.registry.families().collect()
        } else {
            request.families.clone()
        };

        // One throttle for the whole pass: the ceiling is per catalog.
        let mut throttle = Throttle::new(self.config.probe_interval());
        let mut report = SyncReport::default();

        for family in families {
            let format = self.registry.get(family).ok_or_else(|| {
                HarvesterError::Config(format!("no bulletin format registered for {family}"))
            })?;
            report
                .families
                .push(self.sync_family(format, archive, &mut throttle)?);
        }

        tracing::info!(created = report.total_created(), "Synchronization finished");
        Ok(report)
    }

    fn sync_family(
        &self,
        format: &dyn BulletinFormat,
        archive: &mut dyn Archive,
        throttle: &mut Throttle,
    ) -> Result<FamilyReport> {
        let product_type = format.product_type();
        let mut index = match archive.latest_index(product_type)? {
            Some(latest) => format.successor(latest),
            None => format.initial_index(),
        };
        tracing::info!(product_type, start = %index, "Synchronizing");

        let mut created = Vec::new();
        let mut skipped_gaps = Vec::new();
        let mut skipped_unparseable = Vec::new();

        loop {
            let name = format.format_name(self.config.encoding, index);
            if format.index_of(&name).ok() != Some(index) {
                return Err(HarvesterError::parse(
                    &name,
                    format!("{product_type} index {index} has no file name that reads back"),
                ));
            }
            let url = format.remote_url(&self.config.base_url, &name)?;

            throttle.wait();
            match self.catalog.probe(&url)? {
                Probe::Found { size } => {
                    match self.build_record(format, &name, &url, size, throttle)? {
                        Some(record) => {
                            archive.create(record)?;
                            tracing::info!(product_type, %name, %index, "Archived");
                            created.push(index);
                        }
                        None => skipped_unparseable.push(index),
                    }
                }
                Probe::NotFound if format.is_known_gap(index) => {
                    tracing::debug!(product_type, %name, %index, "Known gap, continuing");
                    skipped_gaps.push(index);
                }
                Probe::NotFound => {
                    tracing::info!(product_type, %name, %index, "Not in catalog, stopping");
                    break;
                }
            }

            index = format.successor(index);
        }

        Ok(FamilyReport {
            family: format.family(),
            created,
            skipped_gaps,
            skipped_unparseable,
            stopped_at: index,
        })
    }

    /// Record for a document the catalog reported as present.
    ///
    /// Without a download directory the record is built from the file name
    /// and sized from the probe. With one, the document is fetched, stored
    /// and analyzed; `None` means it failed to parse under
    /// [`ParseFailurePolicy::Skip`].
    fn build_record(
        &self,
        format: &dyn BulletinFormat,
        name: &str,
        url: &str,
        size: Option<u64>,
        throttle: &mut Throttle,
    ) -> Result<Option<MetadataRecord>> {
        let mut record = match &self.config.download_dir {
            None => {
                let mut record = format.extract_metadata(&[Path::new(name)], false)?;
                record.core.size = size;
                record
            }
            Some(dir) => {
                throttle.wait();
                let bytes = self.catalog.fetch(url)?;
                fs::create_dir_all(dir)?;
                let path = dir.join(name);
                fs::write(&path, &bytes)?;

                let mut record = match format.extract_metadata(&[path.as_path()], true) {
                    Ok(record) => record,
                    Err(e)
                        if e.is_parse_error()
                            && self.config.on_parse_error == ParseFailurePolicy::Skip =>
                    {
                        tracing::warn!(%name, error = %e, "Skipping unparseable bulletin");
                        if let Err(e) = fs::remove_file(&path) {
                            tracing::warn!(path = %path.display(), error = %e, "Could not remove download");
                        }
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                };
                record.core.size = Some(bytes.len() as u64);
                record
            }
        };

        record.core.remote_url = url.to_string();
        record.activate();
        Ok(Some(record))
    }
}
