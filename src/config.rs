//! Loader configuration
//!
//! Read from TOML. Every field is optional:
//!
//! ```toml
//! max_document_bytes = 16777216
//! duplicate_ids = "overwrite"   # or "reject"
//! log_level = "info"
//! ```

use crate::core::normalize::{DuplicateIdPolicy, NormalizeOptions};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upload ceiling for a single export (16 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AtlasConfig {
    /// Largest export the loader will read
    pub max_document_bytes: u64,

    /// Handling of repeated entity IDs within one list
    pub duplicate_ids: DuplicateIdPolicy,

    /// Default `tracing` filter for the command-line tool
    pub log_level: String,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        AtlasConfig {
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            duplicate_ids: DuplicateIdPolicy::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AtlasConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            duplicate_ids: self.duplicate_ids,
        }
    }
}
