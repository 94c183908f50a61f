use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("texts list cannot be empty")]
    EmptyInput,

    #[error("invalid embedding client configuration: {0}")]
    Config(String),

    #[error("embedding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding service returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    Dimension { expected: usize, got: usize },
}

/// Generator of fixed-dimension embedding vectors.
///
/// The dimension is a deployment constant the store must match exactly;
/// callers batch inputs according to [`max_batch_size`](Self::max_batch_size).
/// Failure of the backing service is surfaced, never substituted with
/// placeholder vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Dimensionality of every vector this provider returns.
    fn dimension(&self) -> usize;

    /// Largest input batch a single `embed` call accepts.
    fn max_batch_size(&self) -> usize;

    /// Embed a non-empty list of texts, one vector per input, same order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}
