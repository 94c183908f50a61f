//! Deployment settings for the service.

use std::path::PathBuf;

use normindex_ai::{DEFAULT_DIMENSION, DEFAULT_MODEL};
use normindex_sync::GII_BASE_URL;

/// Wiring for the real collaborators. Defaults match the public
/// gesetze-im-internet.de site and a local Ollama instance.
#[derive(Debug, Clone)]
pub struct Settings {
    /// DuckDB database file.
    pub db_path: PathBuf,
    /// Base URL of the statute/catalog site.
    pub gii_base_url: String,
    /// Base URL of the Ollama-compatible embedding service.
    pub embed_base_url: String,
    pub embed_model: String,
    pub embed_auth_token: Option<String>,
    /// Must match the store's vector column exactly.
    pub embed_dimension: usize,
    /// Texts per embedding request.
    pub embed_batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("normindex.duckdb"),
            gii_base_url: GII_BASE_URL.to_string(),
            embed_base_url: "http://localhost:11434".to_string(),
            embed_model: DEFAULT_MODEL.to_string(),
            embed_auth_token: None,
            embed_dimension: DEFAULT_DIMENSION,
            embed_batch_size: 50,
        }
    }
}
