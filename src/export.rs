/// CSV snapshot of the latest scoring run.
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::pipeline::ResumeOutcome;

/// Label written in the `suitability` column for resumes that failed.
const ERROR_LABEL: &str = "Error";

const HEADER: [&str; 5] = ["name", "similarity", "skills", "suitability", "error"];

#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    name: &'a str,
    similarity: Option<f64>,
    skills: String,
    suitability: &'a str,
    error: String,
}

impl<'a> From<&'a ResumeOutcome> for SnapshotRow<'a> {
    fn from(outcome: &'a ResumeOutcome) -> Self {
        match outcome {
            ResumeOutcome::Scored(result) => Self {
                name: &result.name,
                similarity: Some(result.similarity),
                skills: result.skills.joined(),
                suitability: result.suitability.label(),
                error: String::new(),
            },
            ResumeOutcome::Failed { name, error } => Self {
                name,
                similarity: None,
                skills: String::new(),
                suitability: ERROR_LABEL,
                error: error.to_string(),
            },
        }
    }
}

/// Writes `ranked_candidates.csv`-style snapshots, replacing the previous one.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    path: PathBuf,
}

impl SnapshotWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, outcomes: &[ResumeOutcome]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        // Rows go to a private sibling, renamed over the snapshot once complete
        let partial = self.partial_path();
        let written = write_rows(&partial, outcomes).and_then(|()| {
            fs::rename(&partial, &self.path)
                .with_context(|| format!("failed to replace {}", self.path.display()))
        });
        if written.is_err() {
            let _ = fs::remove_file(&partial);
        }
        written?;

        info!(
            "Wrote {} row(s) to {}",
            outcomes.len(),
            self.path.display()
        );
        Ok(())
    }

    fn partial_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path
            .with_file_name(format!(".{name}.{}.part", Uuid::new_v4()))
    }
}

fn write_rows(path: &Path, outcomes: &[ResumeOutcome]) -> Result<()> {
    // Header written by hand so an empty run still yields a valid table
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    writer
        .write_record(HEADER)
        .context("failed to write snapshot header")?;
    for outcome in outcomes {
        writer
            .serialize(SnapshotRow::from(outcome))
            .context("failed to write snapshot row")?;
    }
    writer.flush().context("failed to flush snapshot")?;
    Ok(())
}
