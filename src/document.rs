//! Uploaded documents and their transient on-disk staging.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

/// An uploaded file: declared name plus raw content.
#[derive(Debug, Clone)]
pub struct Document {
    pub filename: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }

    /// Read a document from the local filesystem, keeping only its file name.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let content = fs::read(path)?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { filename, content })
    }
}

/// Directory where uploads are staged while their text is extracted.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `doc` under a unique name. The file is removed when the returned
    /// guard is dropped.
    pub fn stage(&self, doc: &Document) -> io::Result<StagedDocument> {
        fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("{}_{}", Uuid::new_v4(), sanitize_filename(&doc.filename)));
        fs::write(&path, &doc.content)?;
        Ok(StagedDocument { path })
    }
}

/// A staged upload. Deleting the file is tied to the guard's lifetime.
#[derive(Debug)]
pub struct StagedDocument {
    path: PathBuf,
}

impl StagedDocument {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedDocument {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!("Failed to remove staged upload {}: {e}", self.path.display());
            }
        }
    }
}

/// Reduce a client-supplied name to a safe single path component, keeping the
/// extension so the normalizer can pick a parser.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
