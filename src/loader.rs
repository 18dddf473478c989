//! Export loader: bytes on disk to an indexed model
//!
//! The loader is the only place the crate touches I/O. It enforces the
//! configured size ceiling before parsing, then hands the parsed document to
//! the normalizer.

use crate::config::AtlasConfig;
use crate::core::model::AuthorizationModel;
use crate::core::normalize::normalize_with;
use crate::error::{AtlasError, Result};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};

/// Reads authorization exports under one configuration
#[derive(Debug, Clone, Default)]
pub struct ExportLoader {
    config: AtlasConfig,
}

impl ExportLoader {
    pub fn new(config: AtlasConfig) -> Self {
        ExportLoader { config }
    }

    pub fn config(&self) -> &AtlasConfig {
        &self.config
    }

    /// Load and normalize the export at `path`
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<AuthorizationModel> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let limit = self.config.max_document_bytes;
        if file.metadata()?.len() > limit {
            return Err(AtlasError::DocumentTooLarge { limit });
        }

        info!("Loading authorization export: {:?}", path);
        self.load_reader(BufReader::new(file))
    }

    /// Load and normalize an export from any reader
    ///
    /// Reads at most one byte past the limit to detect oversized input.
    pub fn load_reader<R: Read>(&self, reader: R) -> Result<AuthorizationModel> {
        let limit = self.config.max_document_bytes;
        let mut bytes = Vec::new();
        reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
        if bytes.len() as u64 > limit {
            return Err(AtlasError::DocumentTooLarge { limit });
        }
        self.load_slice(&bytes)
    }

    /// Load and normalize an export held in memory
    pub fn load_str(&self, text: &str) -> Result<AuthorizationModel> {
        let limit = self.config.max_document_bytes;
        if text.len() as u64 > limit {
            return Err(AtlasError::DocumentTooLarge { limit });
        }
        self.load_slice(text.as_bytes())
    }

    fn load_slice(&self, bytes: &[u8]) -> Result<AuthorizationModel> {
        debug!(bytes = bytes.len(), "Parsing authorization export");
        let raw: Value = serde_json::from_slice(bytes)?;
        let model = normalize_with(&raw, &self.config.normalize_options())?;
        info!(
            users = model.users().len(),
            roles = model.roles().len(),
            policies = model.policies().len(),
            groups = model.groups().len(),
            "Authorization export loaded"
        );
        Ok(model)
    }
}
