use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use resume_matcher::config::Config;
use resume_matcher::document::Document;
use resume_matcher::embedder::{LazyEmbedder, download};
use resume_matcher::pipeline::{Pipeline, ResumeOutcome};
use resume_matcher::web::{self, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resume-matcher", version, about)]
struct Cli {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the upload form and API (default)
    Serve {
        /// Load the embedding model before accepting requests
        #[arg(long)]
        preload: bool,
    },
    /// Score resume files against a job description and print the table
    Match {
        /// Job description file
        #[arg(long)]
        job: PathBuf,
        /// Resume files
        #[arg(required = true)]
        resumes: Vec<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Download the embedding model files and exit
    DownloadModel,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    info!("Starting resume-matcher v{}", env!("CARGO_PKG_VERSION"));

    // 1. Load config
    let config = Config::load(&cli.config)?;
    config.validate().context("invalid configuration")?;

    match cli.command.unwrap_or(Command::Serve { preload: false }) {
        Command::DownloadModel => {
            tokio::task::spawn_blocking(move || {
                download::download_model_files(Path::new(&config.model.dir), &config.model.repo_url)
            })
            .await??;
            Ok(())
        }
        Command::Match { job, resumes, json } => run_match(config, &job, &resumes, json).await,
        Command::Serve { preload } => run_server(config, preload).await,
    }
}

/// Build the shared services. Dictionary and directory failures end the
/// process here, before anything is served.
fn build_services(config: &Config) -> Result<(Arc<LazyEmbedder>, Arc<Pipeline>)> {
    // 2. Prepare upload/output directories
    config.ensure_directories()?;

    // 3. Embedding model (loaded on first use)
    let model = Arc::new(LazyEmbedder::onnx(config.model.clone()));

    // 4. Skill dictionary + pipeline
    let pipeline = Pipeline::from_config(config, model.clone())?;

    Ok((model, Arc::new(pipeline)))
}

async fn run_server(config: Config, preload: bool) -> Result<()> {
    let (model, pipeline) = build_services(&config)?;

    if preload {
        let warm = model.clone();
        tokio::task::spawn_blocking(move || warm.get().map(|_| ()))
            .await?
            .context("failed to preload embedding model")?;
    }

    let state = AppState {
        pipeline,
        model,
        config: Arc::new(config),
    };
    web::serve(state).await
}

async fn run_match(config: Config, job: &Path, resumes: &[PathBuf], json: bool) -> Result<()> {
    let (_, pipeline) = build_services(&config)?;

    let job = Document::from_path(job).with_context(|| format!("failed to read {}", job.display()))?;
    let resumes = resumes.to_vec();

    // Unreadable resumes become failed rows; only the job read is fatal
    let outcomes = tokio::task::spawn_blocking(move || pipeline.run_paths(&job, &resumes)).await??;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
        return Ok(());
    }

    println!("{:<32} {:>10}  {:<20}  SKILLS", "CANDIDATE", "SIMILARITY", "SUITABILITY");
    for outcome in &outcomes {
        match outcome {
            ResumeOutcome::Scored(r) => println!(
                "{:<32} {:>10.2}  {:<20}  {}",
                r.name, r.similarity, r.suitability, r.skills
            ),
            ResumeOutcome::Failed { name, error } => println!("{name:<32} {:>10}  ERROR: {error}", "-"),
        }
    }
    Ok(())
}
