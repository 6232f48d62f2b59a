//! IERS Harvester - Extract metadata from IERS bulletins and discover new ones.
//!
//! The International Earth Rotation and Reference Systems Service publishes
//! four bulletin series (A, B, C and D) as text and XML files on its data
//! center. This crate reads the creation date and validity interval out of
//! those documents and walks each series' index space to find bulletins
//! that are not archived yet.
//!
//! # Example
//!
//! ```
//! use iers_harvester::bulletin::{create_bulletin_registry, BulletinFormat};
//! use iers_harvester::types::{BulletinIndex, Encoding, Family};
//!
//! let registry = create_bulletin_registry();
//! let format = registry.get(Family::A).unwrap();
//!
//! let name = format.format_name(Encoding::Xml, BulletinIndex::volume(38, 2));
//! assert_eq!(name, "bulletina-xxxviii-002.xml");
//! assert_eq!(format.index_of(&name).unwrap(), BulletinIndex::volume(38, 2));
//! ```
//!
//! # Architecture
//!
//! - [`roman`]: Roman numeral conversion for Bulletin A volumes
//! - [`dates`]: Named, MJD and calendar date parsing
//! - [`types`]: Families, indices and metadata records
//! - [`error`]: Error types and Result alias
//! - [`config`]: Constants and synchronization settings
//! - [`xml`]: Namespaced XML navigation
//! - [`document`]: Raw document access
//! - [`bulletin`]: Per-family formats and the format registry
//! - [`http`]: HTTP client for the data center
//! - [`catalog`]: Remote existence probes and downloads
//! - [`archive`]: Metadata record stores
//! - [`sync`]: Index-walk synchronization
//! - [`cli`]: Command-line interface

pub mod archive;
pub mod bulletin;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod dates;
pub mod document;
pub mod error;
pub mod http;
pub mod roman;
pub mod sync;
pub mod types;
pub mod xml;

// Re-export commonly used items
pub use bulletin::{create_bulletin_registry, BulletinFormat, BulletinRegistry};
pub use config::SyncConfig;
pub use error::{HarvesterError, Result};
pub use sync::{SyncReport, SyncRequest, Synchronizer};
pub use types::{BulletinIndex, Encoding, Family, MetadataRecord};
