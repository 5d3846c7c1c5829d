//! Document text extraction and cleaning.
//!
//! [`normalize`] picks a parser from the file extension, extracts raw text and
//! runs [`clean_text`] over it. The output is lower-case, free of URLs and
//! e-mail addresses, and single-space separated, so that substring skill
//! matching is insensitive to case, punctuation, and layout.
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use pulldown_cmark::{Event, Parser};
use regex::Regex;
use scraper::Html;
use thiserror::Error;

/// Raised when a document cannot be turned into text.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("unreadable document {filename}: {reason}")]
    Unreadable { filename: String, reason: String },
}

impl DocumentError {
    fn unreadable(path: &Path, reason: impl ToString) -> Self {
        Self::Unreadable {
            filename: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            reason: reason.to_string(),
        }
    }
}

/// Parser selected for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Html,
    Markdown,
    PlainText,
}

impl DocumentKind {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "html" | "htm" => Self::Html,
            "md" | "markdown" => Self::Markdown,
            _ => Self::PlainText,
        }
    }
}

/// Extract and clean the text of the document at `path`.
pub fn normalize(path: &Path) -> Result<String, DocumentError> {
    let raw = extract_text(path)?;
    Ok(clean_text(&raw))
}

/// Extract raw text from the document at `path` without cleaning it.
pub fn extract_text(path: &Path) -> Result<String, DocumentError> {
    let bytes = fs::read(path).map_err(|e| DocumentError::unreadable(path, e))?;
    let kind = DocumentKind::from_path(path);

    match kind {
        DocumentKind::Pdf => pdf_text(&bytes).map_err(|e| DocumentError::unreadable(path, e)),
        DocumentKind::Docx => docx_text(&bytes).map_err(|e| DocumentError::unreadable(path, e)),
        DocumentKind::Html => {
            let source = utf8(path, bytes)?;
            Ok(html_text(&source))
        }
        DocumentKind::Markdown => {
            let source = utf8(path, bytes)?;
            Ok(markdown_text(&source))
        }
        DocumentKind::PlainText => utf8(path, bytes),
    }
}

fn utf8(path: &Path, bytes: Vec<u8>) -> Result<String, DocumentError> {
    String::from_utf8(bytes).map_err(|e| DocumentError::unreadable(path, e))
}

fn pdf_text(bytes: &[u8]) -> Result<String, lopdf::Error> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }
    doc.extract_text(&pages)
}

fn docx_text(bytes: &[u8]) -> Result<String, docx_rs::ReaderError> {
    use docx_rs::{DocumentChild, ParagraphChild, RunChild};

    let docx = docx_rs::read_docx(bytes)?;
    let mut out = String::new();

    for child in &docx.document.children {
        let DocumentChild::Paragraph(paragraph) = child else {
            continue;
        };
        for p_child in &paragraph.children {
            let ParagraphChild::Run(run) = p_child else {
                continue;
            };
            for r_child in &run.children {
                match r_child {
                    RunChild::Text(text) => out.push_str(&text.text),
                    RunChild::Tab(_) => out.push(' '),
                    RunChild::Break(_) => out.push('\n'),
                    _ => {}
                }
            }
        }
        out.push('\n');
    }

    Ok(out)
}

fn html_text(source: &str) -> String {
    let document = Html::parse_document(source);
    document.root_element().text().collect::<Vec<_>>().join(" ")
}

fn markdown_text(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for event in Parser::new(source) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak | Event::End(_) => out.push(' '),
            _ => {}
        }
    }
    out
}

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?://|www\.)\S+").unwrap());
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());
static NON_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s+#./\-]").unwrap());

/// Lower-case `raw`, strip URLs, e-mail addresses and symbols other than
/// `+ # . / -`, and collapse whitespace.
///
/// Symbols hanging off a token edge are dropped (`"rust."` → `"rust"`),
/// while in-token and leading-dot forms survive (`c++`, `node.js`, `.net`).
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let without_urls = URL_RE.replace_all(&lower, " ");
    let without_emails = EMAIL_RE.replace_all(&without_urls, " ");
    let textual = NON_TEXT_RE.replace_all(&without_emails, " ");

    textual
        .split_whitespace()
        .map(|token| {
            token
                .trim_end_matches(['.', '/', '-'])
                .trim_start_matches(['/', '-'])
        })
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
