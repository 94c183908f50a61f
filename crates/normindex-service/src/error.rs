use thiserror::Error;

use normindex_ai::EmbedError;
use normindex_core::ParseError;
use normindex_store::StoreError;
use normindex_sync::{CatalogError, SourceError};

/// Failure taxonomy of the service surface. Each upstream collaborator
/// keeps its own variant so callers can tell which one failed.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid legal code: {0}")]
    Validation(String),

    #[error("unknown legal code '{0}': not in the catalog of importable codes")]
    UnknownCode(String),

    #[error("no legal texts found for {0}")]
    NotFound(String),

    #[error("no citable units extracted for code '{0}'")]
    NoUnits(String),

    #[error("document source: {0}")]
    Source(#[from] SourceError),

    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("document parse: {0}")]
    Parse(#[from] ParseError),

    #[error("embedding generator: {0}")]
    Embedding(#[from] EmbedError),

    #[error("storage: {0}")]
    Store(#[from] StoreError),
}
