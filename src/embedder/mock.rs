/// Mock embedder for testing purposes.
///
/// Feature-hashes whitespace tokens into signed buckets, so texts that share
/// words land close together and unrelated texts stay far apart.
use std::hash::{DefaultHasher, Hash, Hasher};

use super::{Embedder, EmbedderError, Embedding};

/// A mock embedder that produces deterministic bag-of-words vectors.
///
/// Useful for testing without loading a real ONNX model. Text without any
/// tokens embeds to the zero vector.
pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 384 }
    }
}

impl Embedder for MockEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return Ok(embedding);
        }

        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let hash = hasher.finish();

            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if (hash >> 63) == 0 { 1.0 } else { -1.0 };
            embedding[bucket] += sign;
        }

        let norm = embedding.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }

        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::cosine_similarity;

    #[test]
    fn test_mock_embed_dimensions() {
        let embedder = MockEmbedder::new(16);
        assert_eq!(embedder.embed("hello world").unwrap().len(), 16);
        assert!(MockEmbedder::new(0).embed("hello").unwrap().is_empty());
    }

    #[test]
    fn test_mock_embed_deterministic() {
        let embedder = MockEmbedder::new(384);
        let a = embedder.embed("hello").unwrap();
        let b = embedder.embed("hello").unwrap();
        assert_eq!(a, b, "same input should produce same output");
    }

    #[test]
    fn test_mock_embed_different_inputs() {
        let embedder = MockEmbedder::new(384);
        let a = embedder.embed("hello").unwrap();
        let b = embedder.embed("world").unwrap();
        assert_ne!(a, b, "different inputs should produce different outputs");
    }

    #[test]
    fn test_mock_embed_normalized() {
        let embedder = MockEmbedder::new(384);
        let vec = embedder.embed("test normalization").unwrap();
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.01,
            "vector should be approximately unit length, got {norm}"
        );
    }

    #[test]
    fn test_mock_embed_empty_is_zero() {
        let embedder = MockEmbedder::default();
        let vec = embedder.embed("").unwrap();
        assert_eq!(vec.len(), 384);
        assert!(vec.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_mock_word_overlap_raises_similarity() {
        let embedder = MockEmbedder::default();
        let job = embedder.embed("rust engineer tokio axum postgres").unwrap();
        let close = embedder.embed("rust engineer tokio axum").unwrap();
        let far = embedder.embed("pastry chef croissant").unwrap();
        assert!(cosine_similarity(&job, &close) > cosine_similarity(&job, &far));
    }
}
