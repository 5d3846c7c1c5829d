use axum::{
    Json,
    extract::{Multipart, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

use super::AppState;
use super::error::AppError;
use super::render;
use crate::document::Document;
use crate::pipeline::ResumeOutcome;
use crate::skills::SkillExtractor;

pub const SNAPSHOT_ROUTE: &str = "/download/ranked_candidates.csv";

#[derive(Serialize)]
pub struct MatchReport {
    pub generated_at: DateTime<Utc>,
    pub job: String,
    pub results: Vec<ResumeOutcome>,
}

pub async fn handle_index() -> Html<String> {
    Html(render::index_page())
}

pub async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model_loaded": state.model.is_loaded(),
        "skills": state.pipeline.skills().len(),
    }))
}

/// `POST /upload`: browser form submission, answered with an HTML table.
/// Failures are rendered as an HTML page with the matching status.
pub async fn handle_upload(State(state): State<AppState>, multipart: Multipart) -> Response {
    let result = async {
        let (job, resumes) = read_upload(multipart).await?;
        let job_name = job.filename.clone();
        let outcomes = run_pipeline(&state, job, resumes).await?;
        Ok::<_, AppError>((job_name, outcomes))
    }
    .await;

    match result {
        Ok((job_name, outcomes)) => {
            let snapshot = state.pipeline.snapshot().map(|_| SNAPSHOT_ROUTE);
            Html(render::results_page(&job_name, &outcomes, snapshot)).into_response()
        }
        Err(e) => {
            let (status, _, message) = e.parts();
            (status, Html(render::error_page(&message))).into_response()
        }
    }
}

/// `POST /api/match`: same input as the form, answered with JSON.
pub async fn handle_api_match(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<MatchReport>, AppError> {
    let (job, resumes) = read_upload(multipart).await?;
    let job_name = job.filename.clone();
    let results = run_pipeline(&state, job, resumes).await?;

    Ok(Json(MatchReport {
        generated_at: Utc::now(),
        job: job_name,
        results,
    }))
}

/// `GET /download/ranked_candidates.csv`: the latest snapshot.
pub async fn handle_snapshot(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let Some(writer) = state.pipeline.snapshot() else {
        return Err(AppError::NotFound("snapshot export is disabled".to_string()));
    };

    let bytes = match tokio::fs::read(writer.path()).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::NotFound("no results exported yet".to_string()));
        }
        Err(e) => return Err(AppError::Internal(e.into())),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"ranked_candidates.csv\"",
            ),
        ],
        bytes,
    ))
}

/// Run the blocking pipeline off the async executor.
async fn run_pipeline(
    state: &AppState,
    job: Document,
    resumes: Vec<Document>,
) -> Result<Vec<ResumeOutcome>, AppError> {
    let pipeline = state.pipeline.clone();
    let outcomes = tokio::task::spawn_blocking(move || pipeline.run(&job, &resumes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("scoring task failed: {e}")))??;
    Ok(outcomes)
}

/// Collect `job_description` and `resumes` file parts.
///
/// Resume parts without a filename (an empty file input) are ignored.
async fn read_upload(mut multipart: Multipart) -> Result<(Document, Vec<Document>), AppError> {
    let mut job: Option<Document> = None;
    let mut resumes = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().unwrap_or_default().to_string();

        match name.as_str() {
            "job_description" => {
                let content = field.bytes().await?;
                job = Some(Document::new(filename, content.to_vec()));
            }
            "resumes" => {
                let content = field.bytes().await?;
                if !filename.is_empty() {
                    resumes.push(Document::new(filename, content.to_vec()));
                }
            }
            _ => {}
        }
    }

    let Some(job) = job else {
        return Err(AppError::Validation(
            "Job description file missing".to_string(),
        ));
    };
    if job.filename.is_empty() || resumes.is_empty() {
        return Err(AppError::Validation(
            "Please upload job description and at least one resume".to_string(),
        ));
    }

    Ok((job, resumes))
}
