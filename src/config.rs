/// Configuration module for resume-matcher.
///
/// Handles loading, validating, and providing default configuration values.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::scoring::Thresholds;

// ── Default value functions ──────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_upload_dir() -> String {
    "static/uploads".to_string()
}

fn default_output_dir() -> String {
    "outputs".to_string()
}

fn default_snapshot_file() -> String {
    "ranked_candidates.csv".to_string()
}

fn default_skills_path() -> String {
    "skills.json".to_string()
}

fn default_model_name() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_repo_url() -> String {
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main".to_string()
}

fn default_model_dir() -> String {
    "models/all-MiniLM-L6-v2".to_string()
}

fn default_dimensions() -> usize {
    384
}

fn default_max_length() -> usize {
    256
}

fn default_intra_threads() -> usize {
    4
}

fn default_true() -> bool {
    true
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub model: ModelConfig,

    /// JSON array of known skill names.
    #[serde(default = "default_skills_path")]
    pub skills_path: String,

    #[serde(default)]
    pub thresholds: Thresholds,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on a whole multipart upload request.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Transient staging area for uploaded documents.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Base URL the model files are fetched from when missing locally.
    #[serde(default = "default_repo_url")]
    pub repo_url: String,

    #[serde(default = "default_model_dir")]
    pub dir: String,

    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Token limit applied before inference.
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,

    #[serde(default = "default_true")]
    pub auto_download: bool,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            model: ModelConfig::default(),
            skills_path: default_skills_path(),
            thresholds: Thresholds::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            output_dir: default_output_dir(),
            snapshot_file: default_snapshot_file(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            repo_url: default_repo_url(),
            dir: default_model_dir(),
            dimensions: default_dimensions(),
            max_length: default_max_length(),
            intra_threads: default_intra_threads(),
            auto_download: default_true(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and, for the
    /// default path only, writes a template next to the binary's cwd.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.server.port > 0, "server.port must be positive");
        anyhow::ensure!(
            self.server.max_upload_bytes > 0,
            "server.max_upload_bytes must be positive"
        );
        anyhow::ensure!(
            self.model.dimensions > 0,
            "model.dimensions must be positive"
        );
        anyhow::ensure!(
            self.model.max_length > 0,
            "model.max_length must be positive"
        );
        anyhow::ensure!(
            !self.storage.snapshot_file.trim().is_empty(),
            "storage.snapshot_file must not be empty"
        );
        anyhow::ensure!(
            !self.skills_path.trim().is_empty(),
            "skills_path must not be empty"
        );
        self.thresholds.validate()?;
        Ok(())
    }

    /// Full path of the CSV snapshot.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        Path::new(&self.storage.output_dir).join(&self.storage.snapshot_file)
    }

    /// Create the upload and output directories if they are missing.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.storage.upload_dir, &self.storage.output_dir] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create directory: {dir}"))?;
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.model.dimensions, 384);
        assert_eq!(config.model.name, "all-MiniLM-L6-v2");
        assert_eq!(config.model.max_length, 256);
        assert!(config.model.auto_download);
        assert_eq!(config.storage.upload_dir, "static/uploads");
        assert_eq!(config.thresholds.highly_suitable, 0.8);
        assert_eq!(config.thresholds.moderately_suitable, 0.6);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"{"server": {"port": 8080}, "skills_path": "./data/skills.json"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.skills_path, "./data/skills.json");
        // Other fields should have defaults
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.model.dimensions, 384);
    }

    #[test]
    fn test_thresholds_from_json() {
        let json = r#"{"thresholds": {"highly_suitable": 0.9}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.thresholds.highly_suitable, 0.9);
        assert_eq!(config.thresholds.moderately_suitable, 0.6);
    }

    #[test]
    fn test_validate_ok() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_bad_dimensions() {
        let mut config = Config::default();
        config.model.dimensions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_inverted_thresholds() {
        let mut config = Config::default();
        config.thresholds.highly_suitable = 0.5;
        config.thresholds.moderately_suitable = 0.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_custom_path_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.port, 5000);
        // Templates are only generated for the default path
        assert!(!path.exists());
    }

    #[test]
    fn test_load_invalid_json_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.skills_path, "skills.json");
    }

    #[test]
    fn test_snapshot_path() {
        let config = Config::default();
        assert_eq!(
            config.snapshot_path(),
            Path::new("outputs").join("ranked_candidates.csv")
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.server.port, config.server.port);
        assert_eq!(parsed.model.repo_url, config.model.repo_url);
        assert_eq!(parsed.storage.output_dir, config.storage.output_dir);
    }
}
