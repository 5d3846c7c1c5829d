//! Scoring pipeline: one job description against a batch of resumes.
//!
//! Each document is staged to disk, normalized, released, and embedded. A
//! resume that fails any of those steps is reported as
//! [`ResumeOutcome::Failed`] without affecting the rest of the batch; only a
//! failure on the job description aborts the run.
use std::borrow::Borrow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::document::{Document, UploadStore};
use crate::embedder::{Embedder, EmbedderError, Embedding};
use crate::export::SnapshotWriter;
use crate::normalizer::{self, DocumentError};
use crate::scoring::{self, Suitability, Thresholds};
use crate::skills::{SkillDictionary, SkillExtractor, SkillSet};

/// Why a single document could not be scored.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("failed to read document: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Embedding(#[from] EmbedderError),
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("job description {filename} could not be processed: {source}")]
    JobDescription {
        filename: String,
        #[source]
        source: ItemError,
    },
}

impl PipelineError {
    /// The run failed because the embedding model could not be loaded, not
    /// because of the uploaded job description.
    #[must_use]
    pub fn is_model_unavailable(&self) -> bool {
        matches!(
            self,
            Self::JobDescription {
                source: ItemError::Embedding(EmbedderError::ModelLoadFailed(_)),
                ..
            }
        )
    }
}

/// Score for one resume.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    pub name: String,
    /// Cosine similarity scaled to 0–100, two decimals.
    pub similarity: f64,
    pub skills: SkillSet,
    pub suitability: Suitability,
}

/// Per-resume result: a score or the error that prevented one.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResumeOutcome {
    Scored(ScoreResult),
    Failed {
        name: String,
        #[serde(serialize_with = "serialize_display")]
        error: ItemError,
    },
}

impl ResumeOutcome {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Scored(result) => &result.name,
            Self::Failed { name, .. } => name,
        }
    }

    #[must_use]
    pub fn score(&self) -> Option<&ScoreResult> {
        match self {
            Self::Scored(result) => Some(result),
            Self::Failed { .. } => None,
        }
    }
}

fn serialize_display<S: Serializer>(error: &ItemError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

pub struct Pipeline {
    embedder: Arc<dyn Embedder>,
    skills: Arc<dyn SkillExtractor>,
    thresholds: Thresholds,
    store: UploadStore,
    snapshot: Option<SnapshotWriter>,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        skills: Arc<dyn SkillExtractor>,
        store: UploadStore,
    ) -> Self {
        Self {
            embedder,
            skills,
            thresholds: Thresholds::default(),
            store,
            snapshot: None,
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    #[must_use]
    pub fn with_snapshot(mut self, snapshot: SnapshotWriter) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Build the production pipeline around `embedder`: skill dictionary
    /// from disk (an error here must stop startup), staging directory and
    /// CSV snapshot from `config`.
    pub fn from_config(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let skills = SkillDictionary::load(Path::new(&config.skills_path))
            .context("failed to load skill dictionary")?;

        Ok(Self::new(
            embedder,
            Arc::new(skills),
            UploadStore::new(&config.storage.upload_dir),
        )
        .with_thresholds(config.thresholds)
        .with_snapshot(SnapshotWriter::new(config.snapshot_path())))
    }

    #[must_use]
    pub fn skills(&self) -> &Arc<dyn SkillExtractor> {
        &self.skills
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&SnapshotWriter> {
        self.snapshot.as_ref()
    }

    /// Score every resume against `job`, preserving input order.
    pub fn run(
        &self,
        job: &Document,
        resumes: &[Document],
    ) -> Result<Vec<ResumeOutcome>, PipelineError> {
        self.run_batch(job, resumes.iter().map(Ok))
    }

    /// Like [`Pipeline::run`], reading each resume from disk as it is
    /// reached. A resume that cannot be read is reported as failed in its
    /// slot; only the job description is read up front.
    pub fn run_paths(
        &self,
        job: &Document,
        resumes: &[PathBuf],
    ) -> Result<Vec<ResumeOutcome>, PipelineError> {
        self.run_batch(
            job,
            resumes.iter().map(|path| {
                Document::from_path(path).map_err(|source| ResumeOutcome::Failed {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string()),
                    error: ItemError::Read(source),
                })
            }),
        )
    }

    /// Each item is either a loaded resume or the failure that stood in
    /// for loading it.
    fn run_batch<I, D>(&self, job: &Document, resumes: I) -> Result<Vec<ResumeOutcome>, PipelineError>
    where
        I: ExactSizeIterator<Item = Result<D, ResumeOutcome>>,
        D: Borrow<Document>,
    {
        info!(
            "Scoring {} resume(s) against {}",
            resumes.len(),
            job.filename
        );

        let (_, job_embedding) = self
            .prepare(job)
            .map_err(|source| PipelineError::JobDescription {
                filename: job.filename.clone(),
                source,
            })?;

        let outcomes: Vec<ResumeOutcome> = resumes
            .map(|item| {
                let resume = match item {
                    Ok(resume) => resume,
                    Err(unloaded) => {
                        if let ResumeOutcome::Failed { name, error } = &unloaded {
                            warn!("Skipping resume {name}: {error}");
                        }
                        return unloaded;
                    }
                };
                let resume: &Document = resume.borrow();
                match self.score_resume(&job_embedding, resume) {
                    Ok(result) => {
                        debug!(
                            "{}: {:.2}% ({})",
                            result.name, result.similarity, result.suitability
                        );
                        ResumeOutcome::Scored(result)
                    }
                    Err(error) => {
                        warn!("Skipping resume {}: {error}", resume.filename);
                        ResumeOutcome::Failed {
                            name: resume.filename.clone(),
                            error,
                        }
                    }
                }
            })
            .collect();

        let failed = outcomes.iter().filter(|o| o.score().is_none()).count();
        info!(
            "Scored {} resume(s), {failed} failed",
            outcomes.len() - failed
        );

        if let Some(snapshot) = &self.snapshot {
            if let Err(e) = snapshot.write(&outcomes) {
                warn!("Failed to write snapshot: {e:#}");
            }
        }

        Ok(outcomes)
    }

    fn score_resume(
        &self,
        job_embedding: &[f32],
        resume: &Document,
    ) -> Result<ScoreResult, ItemError> {
        let (text, embedding) = self.prepare(resume)?;

        let similarity = f64::from(scoring::cosine_similarity(job_embedding, &embedding))
            .clamp(0.0, 1.0);

        Ok(ScoreResult {
            name: resume.filename.clone(),
            similarity: scoring::to_percent(similarity),
            skills: self.skills.extract(&text),
            suitability: self.thresholds.classify(similarity),
        })
    }

    /// Stage, normalize and embed one document. The staged file is deleted
    /// as soon as its text has been read, whatever the outcome.
    fn prepare(&self, doc: &Document) -> Result<(String, Embedding), ItemError> {
        let text = {
            let staged = self.store.stage(doc)?;
            normalizer::normalize(staged.path())?
        };
        let embedding = self.embedder.embed(&text)?;
        Ok((text, embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::mock::MockEmbedder;
    use tempfile::{TempDir, tempdir};

    const JOB: &str = "Backend engineer: Rust, PostgreSQL, Docker, Kubernetes, AWS.";

    fn pipeline(dir: &TempDir) -> Pipeline {
        let skills = SkillDictionary::from_entries([
            "Rust",
            "PostgreSQL",
            "Docker",
            "Kubernetes",
            "AWS",
            "Photoshop",
        ])
        .unwrap();
        Pipeline::new(
            Arc::new(MockEmbedder::default()),
            Arc::new(skills),
            UploadStore::new(dir.path().join("uploads")),
        )
    }

    fn staged_files(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path().join("uploads"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn test_identical_resume_is_highly_suitable() {
        let dir = tempdir().unwrap();
        let outcomes = pipeline(&dir)
            .run(
                &Document::new("job.txt", JOB),
                &[Document::new("twin.txt", JOB)],
            )
            .unwrap();

        let score = outcomes[0].score().unwrap();
        assert_eq!(score.similarity, 100.0);
        assert_eq!(score.suitability, Suitability::HighlySuitable);
        assert_eq!(
            score.skills.joined(),
            "AWS, Docker, Kubernetes, PostgreSQL, Rust"
        );
    }

    #[test]
    fn test_order_preserved_regardless_of_score() {
        let dir = tempdir().unwrap();
        let resumes = [
            Document::new("weak.txt", "Graphic designer, Photoshop, illustration."),
            Document::new("strong.txt", JOB),
        ];
        let outcomes = pipeline(&dir)
            .run(&Document::new("job.txt", JOB), &resumes)
            .unwrap();

        let names: Vec<&str> = outcomes.iter().map(ResumeOutcome::name).collect();
        assert_eq!(names, vec!["weak.txt", "strong.txt"]);

        let weak = outcomes[0].score().unwrap();
        let strong = outcomes[1].score().unwrap();
        assert!(weak.similarity < strong.similarity);
        assert_eq!(weak.suitability, Suitability::LowFit);
        assert!(weak.skills.contains("Photoshop"));
    }

    #[test]
    fn test_corrupt_resume_is_isolated() {
        let dir = tempdir().unwrap();
        let resumes = [
            Document::new("good.txt", JOB),
            Document::new("broken.pdf", "not a pdf at all"),
            Document::new("also_good.md", "# Rust developer\n\nDocker and AWS"),
        ];
        let outcomes = pipeline(&dir)
            .run(&Document::new("job.txt", JOB), &resumes)
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].score().is_some());
        match &outcomes[1] {
            ResumeOutcome::Failed { name, error } => {
                assert_eq!(name, "broken.pdf");
                assert!(matches!(error, ItemError::Document(_)));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(outcomes[2].score().is_some());
        assert_eq!(staged_files(&dir), 0, "staged uploads must be released");
    }

    #[test]
    fn test_job_failure_aborts_run() {
        let dir = tempdir().unwrap();
        let err = pipeline(&dir)
            .run(
                &Document::new("job.pdf", "garbage"),
                &[Document::new("a.txt", JOB)],
            )
            .unwrap_err();
        assert!(err.to_string().contains("job.pdf"));
        assert_eq!(staged_files(&dir), 0);
    }

    #[test]
    fn test_embedding_failure_is_isolated() {
        struct FailsOn(&'static str);
        impl Embedder for FailsOn {
            fn embed(&self, text: &str) -> Result<Embedding, EmbedderError> {
                if text.contains(self.0) {
                    return Err(EmbedderError::InferenceFailed("boom".into()));
                }
                MockEmbedder::default().embed(text)
            }
            fn dimensions(&self) -> usize {
                384
            }
        }

        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(FailsOn("explode")),
            Arc::new(SkillDictionary::from_entries(["Rust"]).unwrap()),
            UploadStore::new(dir.path().join("uploads")),
        );
        let outcomes = pipeline
            .run(
                &Document::new("job.txt", "rust"),
                &[
                    Document::new("a.txt", "explode"),
                    Document::new("b.txt", "rust"),
                ],
            )
            .unwrap();

        assert!(matches!(
            &outcomes[0],
            ResumeOutcome::Failed {
                error: ItemError::Embedding(_),
                ..
            }
        ));
        assert!(outcomes[1].score().is_some());
        assert_eq!(staged_files(&dir), 0);
    }

    #[test]
    fn test_model_load_failure_is_not_a_job_defect() {
        struct Unloadable;
        impl Embedder for Unloadable {
            fn embed(&self, _: &str) -> Result<Embedding, EmbedderError> {
                Err(EmbedderError::ModelLoadFailed("model.onnx missing".into()))
            }
            fn dimensions(&self) -> usize {
                384
            }
        }

        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(Unloadable),
            Arc::new(SkillDictionary::from_entries(["Rust"]).unwrap()),
            UploadStore::new(dir.path().join("uploads")),
        );
        let err = pipeline
            .run(
                &Document::new("job.txt", "rust"),
                &[Document::new("a.txt", "rust")],
            )
            .unwrap_err();
        assert!(err.is_model_unavailable());

        let unreadable = pipeline
            .run(&Document::new("job.pdf", "not a pdf"), &[])
            .unwrap_err();
        assert!(!unreadable.is_model_unavailable());
    }

    #[test]
    fn test_unreadable_resume_path_is_isolated() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.txt");
        std::fs::write(&present, JOB).unwrap();
        let missing = dir.path().join("missing.txt");

        let outcomes = pipeline(&dir)
            .run_paths(&Document::new("job.txt", JOB), &[missing, present])
            .unwrap();

        assert_eq!(outcomes.len(), 2);
        match &outcomes[0] {
            ResumeOutcome::Failed { name, error } => {
                assert_eq!(name, "missing.txt");
                assert!(matches!(error, ItemError::Read(_)));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(outcomes[1].name(), "present.txt");
        assert_eq!(outcomes[1].score().unwrap().similarity, 100.0);
    }

    #[test]
    fn test_empty_resume_scores_zero() {
        let dir = tempdir().unwrap();
        let outcomes = pipeline(&dir)
            .run(
                &Document::new("job.txt", JOB),
                &[Document::new("empty.txt", "")],
            )
            .unwrap();
        let score = outcomes[0].score().unwrap();
        assert_eq!(score.similarity, 0.0);
        assert_eq!(score.suitability, Suitability::LowFit);
        assert!(score.skills.is_empty());
    }

    #[test]
    fn test_custom_thresholds_apply() {
        let dir = tempdir().unwrap();
        let strict = Thresholds {
            highly_suitable: 1.0,
            moderately_suitable: 1.0,
        };
        let outcomes = pipeline(&dir)
            .with_thresholds(strict)
            .run(
                &Document::new("job.txt", JOB),
                &[Document::new("partial.txt", "Rust and Docker")],
            )
            .unwrap();
        assert_eq!(
            outcomes[0].score().unwrap().suitability,
            Suitability::LowFit
        );
    }

    #[test]
    fn test_snapshot_written() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("out").join("ranked.csv");
        let outcomes = pipeline(&dir)
            .with_snapshot(SnapshotWriter::new(&csv_path))
            .run(
                &Document::new("job.txt", JOB),
                &[Document::new("a.txt", JOB), Document::new("b.pdf", "junk")],
            )
            .unwrap();
        assert_eq!(outcomes.len(), 2);

        let csv = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv.lines().count(), 3);
        assert!(csv.starts_with("name,similarity,skills,suitability,error"));
    }

    #[test]
    fn test_outcome_json_shape() {
        let dir = tempdir().unwrap();
        let outcomes = pipeline(&dir)
            .run(
                &Document::new("job.txt", JOB),
                &[Document::new("a.txt", JOB), Document::new("b.pdf", "junk")],
            )
            .unwrap();
        let json = serde_json::to_value(&outcomes).unwrap();

        assert_eq!(json[0]["status"], "scored");
        assert_eq!(json[0]["suitability"], "Highly Suitable");
        assert!(json[0]["skills"].as_str().unwrap().contains("Rust"));
        assert_eq!(json[1]["status"], "failed");
        assert_eq!(json[1]["name"], "b.pdf");
        assert!(json[1]["error"].as_str().unwrap().contains("b.pdf"));
    }
}
