//! Storage layer: DuckDB-backed citation store with cosine vector search.

mod error;
pub use error::StoreError;

mod filter;
pub use filter::TextFilter;

mod duck;
pub use duck::TextStore;
