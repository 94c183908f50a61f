//! Service layer: the import orchestrator and the retrieval surface.
//!
//! Import sequence for one code: syntax validation, best-effort catalog
//! validation (a catalog outage degrades to an un-validated import, a
//! confirmed miss aborts), container fetch, unwrap, parse, extraction,
//! then chunked embed-and-upsert. Chunks commit independently, so a
//! failure mid-sequence leaves earlier chunks stored; re-running the
//! import is safe because upserts are idempotent per citation.

mod config;
mod error;

pub use config::Settings;
pub use error::ServiceError;

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{info, warn};

use normindex_ai::{EmbedError, EmbeddingProvider, OllamaEmbedder};
use normindex_core::{TextUnit, extract_units, parse};
use normindex_store::{TextFilter, TextStore};
use normindex_sync::{
    CatalogEntry, CatalogService, DocumentSource, GiiCatalogSource, GiiDocumentSource,
    xml_from_zip,
};

const MAX_CODE_LENGTH: usize = 50;

/// Outcome of an import run.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub code: String,
    pub units_imported: usize,
}

/// One semantic search result with its cosine distance
/// (0 = identical direction, 2 = opposite).
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub unit: TextUnit,
    pub distance: f32,
}

/// The boundary surface over store, document source, catalog, and
/// embedding generator.
///
/// Safe to share across concurrent callers: the store sits behind a mutex
/// that is only held for individual synchronous calls, never across an
/// await; citation-level races between imports resolve to last writer
/// wins inside the store itself.
pub struct LegalTextService {
    store: Mutex<TextStore>,
    documents: Arc<dyn DocumentSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    catalog: CatalogService,
}

impl LegalTextService {
    pub fn new(
        store: TextStore,
        documents: Arc<dyn DocumentSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        catalog: CatalogService,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            documents,
            embedder,
            catalog,
        }
    }

    /// Wire up the real collaborators from deployment settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ServiceError> {
        let store = TextStore::open(&settings.db_path, settings.embed_dimension)?;
        let documents = GiiDocumentSource::new(&settings.gii_base_url)?;
        let embedder = OllamaEmbedder::new(
            &settings.embed_base_url,
            &settings.embed_model,
            settings.embed_dimension,
            settings.embed_auth_token.as_deref(),
        )?
        .with_batch_size(settings.embed_batch_size);
        let catalog = CatalogService::new(Arc::new(GiiCatalogSource::new(
            &settings.gii_base_url,
        )?));
        Ok(Self::new(
            store,
            Arc::new(documents),
            Arc::new(embedder),
            catalog,
        ))
    }

    /// Import one code: fetch, parse, extract, embed, upsert.
    pub async fn import(&self, code: &str) -> Result<ImportReport, ServiceError> {
        let code = validate_code(code)?;
        info!(code, "starting import");

        match self.catalog.is_valid_code(&code).await {
            Ok(true) => {}
            Ok(false) => return Err(ServiceError::UnknownCode(code)),
            // A catalog outage must not block imports.
            Err(err) => warn!(
                error = %err,
                code,
                "could not validate code against catalog, proceeding with import"
            ),
        }

        let container = self.documents.fetch(&code).await?;
        let xml = xml_from_zip(&container)?;
        let document = parse(&xml)?;
        let links = self.documents.links_for(&code);
        let units = extract_units(&document, &code, &links);
        if units.is_empty() {
            return Err(ServiceError::NoUnits(code));
        }
        info!(count = units.len(), code, "extracted citable units");

        let mut imported = 0;
        let batch_size = self.embedder.max_batch_size().max(1);
        for chunk in units.chunks(batch_size) {
            let texts: Vec<String> = chunk.iter().map(|unit| unit.text.clone()).collect();
            let vectors = self.embedder.embed(&texts).await?;
            let rows: Vec<(TextUnit, Vec<f32>)> =
                chunk.iter().cloned().zip(vectors).collect();
            imported += self.store().upsert_batch(&rows)?;
        }

        info!(imported, code, "import complete");
        Ok(ImportReport {
            code,
            units_imported: imported,
        })
    }

    /// Exact-citation lookup. Zero matches after a successful query is the
    /// distinct not-found condition.
    pub fn lookup(&self, filter: &TextFilter) -> Result<Vec<TextUnit>, ServiceError> {
        let units = self.store().lookup(filter)?;
        if units.is_empty() {
            return Err(ServiceError::NotFound(describe_filter(filter)));
        }
        Ok(units)
    }

    /// Semantic search within one code. An empty hit list is a valid
    /// outcome, not an error.
    pub async fn search(
        &self,
        code: &str,
        query: &str,
        limit: usize,
        cutoff: Option<f32>,
    ) -> Result<Vec<SearchHit>, ServiceError> {
        let code = validate_code(code)?;
        let vectors = self.embedder.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or(EmbedError::CountMismatch {
                expected: 1,
                got: 0,
            })?;

        let hits = self
            .store()
            .semantic_search(&query_vector, &code, limit, cutoff)?;
        Ok(hits
            .into_iter()
            .map(|(unit, distance)| SearchHit { unit, distance })
            .collect())
    }

    /// Distinct imported codes, ascending.
    pub fn codes(&self) -> Result<Vec<String>, ServiceError> {
        Ok(self.store().codes()?)
    }

    /// Imported codes with their stored unit counts.
    pub fn codes_with_counts(&self) -> Result<Vec<(String, usize)>, ServiceError> {
        let store = self.store();
        let mut out = Vec::new();
        for code in store.codes()? {
            let count = store.count_for_code(&code)?;
            out.push((code, count));
        }
        Ok(out)
    }

    /// Catalog of importable codes (cached, 24 h TTL).
    pub async fn catalog(&self) -> Result<Arc<Vec<CatalogEntry>>, ServiceError> {
        Ok(self.catalog.get_catalog().await?)
    }

    fn store(&self) -> MutexGuard<'_, TextStore> {
        self.store.lock().expect("store mutex poisoned")
    }
}

/// Normalize and validate a code's surface syntax before any network or
/// parse work: ASCII alphanumerics, hyphens, underscores, bounded length;
/// lowercased on success.
fn validate_code(code: &str) -> Result<String, ServiceError> {
    if code.is_empty() {
        return Err(ServiceError::Validation("legal code cannot be empty".into()));
    }
    if code.len() > MAX_CODE_LENGTH {
        return Err(ServiceError::Validation(format!(
            "legal code too long, maximum {MAX_CODE_LENGTH} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ServiceError::Validation(format!(
            "legal code '{code}' may contain only letters, numbers, hyphens, and underscores"
        )));
    }
    Ok(code.to_ascii_lowercase())
}

fn describe_filter(filter: &TextFilter) -> String {
    let mut parts = Vec::new();
    if let Some(code) = &filter.code {
        parts.push(format!("code '{code}'"));
    }
    if let Some(section) = &filter.section {
        parts.push(format!("section '{section}'"));
    }
    if let Some(sub_section) = &filter.sub_section {
        parts.push(format!("sub-section '{sub_section}'"));
    }
    if parts.is_empty() {
        "any citation".to_string()
    } else {
        parts.join(", ")
    }
}
