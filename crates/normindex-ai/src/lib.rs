//! Embedding layer: the remote embedding generator the pipeline depends on.

mod provider;
pub use provider::{EmbedError, EmbeddingProvider};

mod ollama;
pub use ollama::{DEFAULT_DIMENSION, DEFAULT_MODEL, OllamaEmbedder};
