/// ONNX Runtime embedder using the `ort` crate.
///
/// Runs a sentence-transformers ONNX export (all-MiniLM-L6-v2 by default)
/// and mean-pools plus L2-normalizes the token states, matching what
/// `SentenceTransformer.encode` produces for the same model.
use std::path::Path;
use std::sync::Mutex;

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use super::tokenizer::BertTokenizer;
use super::{Embedder, EmbedderError, Embedding};
use crate::config::ModelConfig;

/// ONNX-backed embedder implementing the `Embedder` trait.
pub struct OnnxEmbedder {
    session: Mutex<Session>,
    tokenizer: BertTokenizer,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Create a new `OnnxEmbedder` by loading the model described by `model`.
    ///
    /// Expects `model.onnx` and `tokenizer.json` in `model.dir`.
    pub fn new(model: &ModelConfig) -> Result<Self, EmbedderError> {
        let model_dir = Path::new(&model.dir);
        let model_path = model_dir.join("model.onnx");

        if !model_path.exists() {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model.onnx not found in {}",
                model_dir.display()
            )));
        }

        info!("Initializing ONNX Runtime for {}...", model.name);

        let session = Session::builder()
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("session builder error: {e}")))?
            .with_intra_threads(model.intra_threads)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("thread config error: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("model load error: {e}")))?;

        info!("ONNX model loaded successfully");

        let tokenizer = BertTokenizer::from_model_dir(model_dir, model.max_length)
            .map_err(|e| EmbedderError::ModelLoadFailed(format!("tokenizer error: {e}")))?;

        info!("Tokenizer loaded (vocab size: {})", tokenizer.vocab_size());

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            dimensions: model.dimensions,
        })
    }
}

/// Wrap one `[1, seq_len]` model input.
fn input_tensor(name: &str, data: Vec<i64>) -> Result<Tensor<i64>, EmbedderError> {
    let seq_len = data.len();
    Tensor::from_array(([1usize, seq_len], data))
        .map_err(|e| EmbedderError::InferenceFailed(format!("{name} tensor: {e}")))
}

impl Embedder for OnnxEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        let tokens = self
            .tokenizer
            .tokenize(text)
            .map_err(|e| EmbedderError::TokenizerError(e.to_string()))?;
        let seq_len = tokens.input_ids.len();

        let input_ids = input_tensor("input_ids", tokens.input_ids)?;
        let attention_mask = input_tensor("attention_mask", tokens.attention_mask.clone())?;
        let token_type_ids = input_tensor("token_type_ids", vec![0; seq_len])?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| EmbedderError::InferenceFailed(format!("session lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids,
            ])
            .map_err(|e| EmbedderError::InferenceFailed(e.to_string()))?;

        // last_hidden_state, flattened [1, seq_len, dimensions]
        let (_, hidden) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedderError::InferenceFailed(format!("output extraction: {e}")))?;

        if hidden.len() != seq_len * self.dimensions {
            return Err(EmbedderError::InferenceFailed(format!(
                "model returned {} values for {seq_len} tokens, expected {} per token",
                hidden.len(),
                self.dimensions
            )));
        }

        let mut pooled = mean_pool(hidden, &tokens.attention_mask, self.dimensions);
        normalize(&mut pooled);
        Ok(pooled)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Average the token rows of `hidden` whose attention mask is set.
fn mean_pool(hidden: &[f32], attention_mask: &[i64], dimensions: usize) -> Vec<f32> {
    let mut pooled = vec![0.0f32; dimensions];
    let mut kept = 0usize;

    for (row, _) in hidden
        .chunks_exact(dimensions)
        .zip(attention_mask)
        .filter(|(_, mask)| **mask != 0)
    {
        kept += 1;
        for (acc, value) in pooled.iter_mut().zip(row) {
            *acc += value;
        }
    }

    if kept > 0 {
        let scale = 1.0 / kept as f32;
        pooled.iter_mut().for_each(|v| *v *= scale);
    }
    pooled
}

/// Scale to unit length in place. Zero vectors stay zero.
fn normalize(values: &mut [f32]) {
    let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        values.iter_mut().for_each(|v| *v /= norm);
    }
}
