//! Sync layer: remote gesetze-im-internet.de collaborators, document
//! fetch with container unwrapping, and the TTL-cached code catalog.

pub mod catalog;
pub mod document;

pub use catalog::{CatalogEntry, CatalogError, CatalogService, CatalogSource, GiiCatalogSource};
pub use document::{
    DocumentSource, GII_BASE_URL, GiiDocumentSource, SourceError, xml_from_zip,
};
