/// Embedder trait and shared types for text embedding.
pub mod download;
pub mod lazy;
pub mod mock;
pub mod onnx;
pub mod tokenizer;

use thiserror::Error;

pub use lazy::LazyEmbedder;

/// A fixed-length embedding vector.
pub type Embedding = Vec<f32>;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedderError {
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    #[error("model load failed: {0}")]
    ModelLoadFailed(String),

    #[error("tokenizer error: {0}")]
    TokenizerError(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow concurrent use
/// behind `Arc`.
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a vector.
    ///
    /// Must be deterministic for a given loaded model.
    fn embed(&self, text: &str) -> Result<Embedding, EmbedderError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}
