use crate::core::entity::EntityKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Duplicate {kind} id in export: '{id}'")]
    DuplicateId { kind: EntityKind, id: String },

    #[error("Document too large: exceeds limit of {limit} bytes")]
    DocumentTooLarge { limit: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl AtlasError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        AtlasError::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
