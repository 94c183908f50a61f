use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sub_section filter can only be used when section filter is also provided")]
    SubSectionWithoutSection,

    #[error("embedding dimension mismatch: store holds {expected}, got {got}")]
    Dimension { expected: usize, got: usize },

    #[error("duckdb error: {0}")]
    DuckDb(#[from] duckdb::Error),
}
