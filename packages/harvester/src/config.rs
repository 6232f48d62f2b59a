//! Configuration constants and synchronization settings.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::{HarvesterError, Result};
use crate::types::Encoding;

/// Base URL of the IERS data center.
pub const DATACENTER_URL: &str = "https://datacenter.iers.org/data";

/// Directory below the base URL holding the XML bulletins of every family.
pub const XML_CATALOG: &str = "xml";

/// Hash algorithm recorded for archived bulletins.
pub const HASH_TYPE: &str = "md5";

/// HTTP timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default probe ceiling in requests per minute.
pub const DEFAULT_RATE_LIMIT: u32 = 120;

/// What the synchronizer does when a downloaded bulletin cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseFailurePolicy {
    /// Stop the run and return the parse error.
    #[default]
    Abort,
    /// Log the error, create no record and continue with the successor.
    Skip,
}

impl FromStr for ParseFailurePolicy {
    type Err = HarvesterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(HarvesterError::Config(format!(
                "invalid parse failure policy '{other}', expected 'abort' or 'skip'"
            ))),
        }
    }
}

/// Validate a catalog base URL.
///
/// # Examples
/// ```
/// use iers_harvester::config::validate_base_url;
///
/// assert!(validate_base_url("https://datacenter.iers.org/data").is_ok());
/// assert!(validate_base_url("datacenter.iers.org").is_err());
/// ```
pub fn validate_base_url(base_url: &str) -> Result<()> {
    let url = Url::parse(base_url)
        .map_err(|e| HarvesterError::Config(format!("invalid base URL '{base_url}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(HarvesterError::Config(format!(
            "unsupported scheme '{scheme}' in base URL '{base_url}'"
        ))),
    }
}

/// Settings of a synchronization pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub base_url: String,
    pub encoding: Encoding,
    /// Maximum probes per minute; 0 disables throttling.
    pub rate_limit: u32,
    pub on_parse_error: ParseFailurePolicy,
    /// When set, found bulletins are downloaded here and analyzed.
    pub download_dir: Option<PathBuf>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: DATACENTER_URL.to_string(),
            encoding: Encoding::default(),
            rate_limit: DEFAULT_RATE_LIMIT,
            on_parse_error: ParseFailurePolicy::default(),
            download_dir: None,
        }
    }
}

impl SyncConfig {
    /// Load settings from `IERS_*` environment variables, falling back to
    /// the defaults for unset ones.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base_url) = lookup("IERS_BASE_URL") {
            config = config.with_base_url(base_url)?;
        }
        if let Some(encoding) = lookup("IERS_ENCODING") {
            config.encoding = encoding.parse()?;
        }
        if let Some(rate_limit) = lookup("IERS_RATE_LIMIT") {
            config.rate_limit = rate_limit.trim().parse().map_err(|_| {
                HarvesterError::Config(format!(
                    "IERS_RATE_LIMIT must be a non-negative integer, got '{rate_limit}'"
                ))
            })?;
        }
        if let Some(policy) = lookup("IERS_ON_PARSE_ERROR") {
            config.on_parse_error = policy.parse()?;
        }
        if let Some(dir) = lookup("IERS_DOWNLOAD_DIR").filter(|d| !d.is_empty()) {
            config.download_dir = Some(PathBuf::from(dir));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        validate_base_url(&base_url)?;
        self.base_url = base_url.trim_end_matches('/').to_string();
        Ok(self)
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: u32) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_parse_failure_policy(mut self, policy: ParseFailurePolicy) -> Self {
        self.on_parse_error = policy;
        self
    }

    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Minimum spacing between two probes, `None` when throttling is off.
    #[must_use]
    pub fn probe_interval(&self) -> Option<Duration> {
        (self.rate_limit > 0).then(|| Duration::from_secs_f64(60.0 / f64::from(self.rate_limit)))
    }
}
