/// Lazily loaded embedding service.
///
/// The model is loaded on the first `embed` call and then shared for the
/// life of the process. Concurrent first calls run exactly one load; a
/// failed load leaves the service empty so the next call tries again.
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Instant;

use tracing::{info, warn};

use super::onnx::OnnxEmbedder;
use super::{Embedder, EmbedderError, Embedding, download};
use crate::config::ModelConfig;

type Loader = Box<dyn Fn() -> Result<Arc<dyn Embedder>, EmbedderError> + Send + Sync>;

pub struct LazyEmbedder {
    name: String,
    dimensions: usize,
    loader: Loader,
    model: OnceLock<Arc<dyn Embedder>>,
    init: Mutex<()>,
}

impl LazyEmbedder {
    /// Wrap an arbitrary loader. The loaded embedder must report
    /// `dimensions`.
    pub fn new<F>(name: impl Into<String>, dimensions: usize, loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Embedder>, EmbedderError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            dimensions,
            loader: Box::new(loader),
            model: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    /// ONNX model described by `model`, downloaded first when missing and
    /// `auto_download` is set.
    pub fn onnx(model: ModelConfig) -> Self {
        let name = model.name.clone();
        let dimensions = model.dimensions;
        Self::new(name, dimensions, move || {
            if model.auto_download {
                download::download_model_files(Path::new(&model.dir), &model.repo_url)
                    .map_err(|e| EmbedderError::ModelLoadFailed(format!("{e:#}")))?;
            }
            let embedder = OnnxEmbedder::new(&model)?;
            Ok(Arc::new(embedder) as Arc<dyn Embedder>)
        })
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Return the loaded model, loading it if this is the first use.
    pub fn get(&self) -> Result<&Arc<dyn Embedder>, EmbedderError> {
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        // The guarded value is `()`, so a poisoned lock carries no broken state.
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = self.model.get() {
            return Ok(model);
        }

        info!("Loading embedding model {} (first use)...", self.name);
        let started = Instant::now();

        let loaded = (self.loader)().inspect_err(|e| {
            warn!("Embedding model {} failed to load: {e}", self.name);
        })?;

        if loaded.dimensions() != self.dimensions {
            return Err(EmbedderError::ModelLoadFailed(format!(
                "model {} produces {} dimensions, expected {}",
                self.name,
                loaded.dimensions(),
                self.dimensions
            )));
        }

        info!(
            "Embedding model {} ready in {:.2?}",
            self.name,
            started.elapsed()
        );
        Ok(self.model.get_or_init(|| loaded))
    }
}

impl Embedder for LazyEmbedder {
    fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
        self.get()?.embed(text)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
