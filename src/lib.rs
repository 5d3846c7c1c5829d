//! # resume-matcher — Resume screening server
//!
//! Scores a batch of resumes against one job description: cosine similarity
//! of sentence embeddings, known-skill keyword extraction, and a three-band
//! suitability label, served through a small upload form.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading, validation, and defaults
//! - **[`document`]** — Uploaded documents and transient on-disk staging
//! - **[`normalizer`]** — PDF/DOCX/HTML/Markdown/text extraction and cleaning
//! - **[`embedder`]** — Text embedding via ONNX Runtime (all-MiniLM-L6-v2), loaded lazily
//! - **[`skills`]** — Skill dictionary and substring extraction
//! - **[`scoring`]** — Cosine similarity and suitability thresholds
//! - **[`pipeline`]** — Per-request orchestration with per-resume error isolation
//! - **[`export`]** — CSV snapshot of the latest run
//! - **[`web`]** — axum server: upload form, HTML/JSON results, CSV download

pub mod config;
pub mod document;
pub mod embedder;
pub mod export;
pub mod normalizer;
pub mod pipeline;
pub mod scoring;
pub mod skills;
pub mod web;
