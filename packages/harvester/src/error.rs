//! Error types for the harvester.
//!
//! A single `HarvesterError` enum covers the whole crate. Variants fall into
//! the categories callers need to tell apart: configuration problems,
//! unparseable documents, transport failures and unsupported requests.

use thiserror::Error;

/// Main error type for the harvester library.
#[derive(Debug, Error)]
pub enum HarvesterError {
    /// Invalid or missing configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document or filename could not be parsed.
    #[error("Failed to parse {context}: {message}")]
    Parse { context: String, message: String },

    /// Missing required XML element.
    #[error("Missing required XML element: {element} in {context}")]
    MissingElement { element: String, context: String },

    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// Input that the operation cannot handle (e.g. an unknown extension).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The remote catalog answered with neither success nor not-found.
    #[error("Unexpected HTTP status {status} for {url}")]
    Transport { url: String, status: u16 },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// All download attempts failed.
    #[error("Download failed after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    /// The caller asked for something this harvester does not implement.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Metadata archive failure.
    #[error("Archive error: {0}")]
    Archive(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl HarvesterError {
    /// Build a [`HarvesterError::Parse`].
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Build a [`HarvesterError::MissingElement`].
    pub fn missing_element(element: impl Into<String>, context: impl Into<String>) -> Self {
        Self::MissingElement {
            element: element.into(),
            context: context.into(),
        }
    }

    /// True for errors caused by document content or filenames that do not
    /// have the expected shape.
    #[must_use]
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. } | Self::MissingElement { .. } | Self::XmlParse(_)
        )
    }
}

/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, HarvesterError>;
