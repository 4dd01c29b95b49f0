//! HTTP API server for the learning platform.
//!
//! Provides REST endpoints for importing transcripts, reading questions
//! (which triggers background generation), explicit generation, analytics
//! and resets.

use crate::chunking::chunk_transcript;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::FrageError;
use crate::pipeline::{GeneratedSummary, QuestionPipeline};
use crate::question::Question;
use crate::store::ChunkCount;
use crate::trigger::TriggerController;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Shared application state.
struct AppState {
    pipeline: Arc<QuestionPipeline>,
    trigger: TriggerController,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: Option<String>,
    port: Option<u16>,
    settings: Settings,
) -> anyhow::Result<()> {
    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);

    let pipeline = Arc::new(QuestionPipeline::new(settings)?);
    let trigger = TriggerController::new(pipeline.clone());

    let state = Arc::new(AppState { pipeline, trigger });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/videos", get(list_videos).post(import_video))
        .route(
            "/videos/{video_id}/questions",
            get(get_questions).delete(reset_questions),
        )
        .route(
            "/videos/{video_id}/questions/generate",
            post(generate_questions),
        )
        .route(
            "/videos/{video_id}/questions/analytics",
            get(question_analytics),
        )
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Frage API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("List Videos", "GET    /videos");
    Output::kv("Import Video", "POST   /videos");
    Output::kv("Get Questions", "GET    /videos/:video_id/questions");
    Output::kv("Generate", "POST   /videos/:video_id/questions/generate");
    Output::kv("Analytics", "GET    /videos/:video_id/questions/analytics");
    Output::kv("Reset", "DELETE /videos/:video_id/questions");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportRequest {
    video_id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    language: Option<String>,
    transcript: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImportResponse {
    success: bool,
    video_id: String,
    title: String,
    language: String,
    chunks: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoListResponse {
    videos: Vec<VideoInfo>,
    total: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VideoInfo {
    video_id: String,
    title: String,
    language: String,
    question_count: u32,
    imported_at: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionsResponse {
    video_id: String,
    questions: Vec<Question>,
    total_questions: usize,
    chunk_distribution: Vec<ChunkCount>,
    max_questions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct GenerateRequest {
    question_count: Option<u32>,
    target_chunks: Option<Vec<usize>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    success: bool,
    message: String,
    total_questions: u32,
    questions_generated: Vec<GeneratedSummary>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AtCapResponse {
    message: String,
    current_count: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetResponse {
    success: bool,
    message: String,
    total_questions: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsResponse {
    video_id: String,
    chunk_coverage: Vec<ChunkCount>,
    potential_duplicates: Vec<DuplicateInfo>,
    recommendation: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DuplicateInfo {
    dedup_hash: String,
    questions: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn import_video(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> impl IntoResponse {
    if req.transcript.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Transcript must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let settings = state.pipeline.settings();
    let title = req.title.unwrap_or_else(|| req.video_id.clone());
    let language = req
        .language
        .unwrap_or_else(|| settings.questions.default_language.clone());
    let chunks = chunk_transcript(
        &req.transcript,
        settings.chunking.max_chunk_chars,
        settings.chunking.overlap_chars,
    )
    .len();

    match state
        .pipeline
        .import_video(&req.video_id, &title, &language, &req.transcript)
        .await
    {
        Ok(record) => Json(ImportResponse {
            success: true,
            video_id: record.video_id,
            title: record.title,
            language: record.language,
            chunks,
        })
        .into_response(),
        Err(FrageError::InvalidInput(e)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse { error: e }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn list_videos(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.pipeline.store().list_videos().await {
        Ok(videos) => Json(VideoListResponse {
            total: videos.len(),
            videos: videos
                .into_iter()
                .map(|v| VideoInfo {
                    video_id: v.video_id,
                    title: v.title,
                    language: v.language,
                    question_count: v.question_count,
                    imported_at: v.imported_at.to_rfc3339(),
                })
                .collect(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Read the persisted questions for a video.
///
/// Always answers 200: a storage failure yields the empty shape with an
/// error note so the learner-facing quiz keeps working. A successful read
/// below the question cap tries to spawn a background generation round.
async fn get_questions(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    let store = state.pipeline.store();
    let max_questions = state.pipeline.cap();

    let (questions, distribution) = match (
        store.questions_for_video(&video_id).await,
        store.counts_by_chunk(&video_id).await,
    ) {
        (Ok(questions), Ok(distribution)) => (questions, distribution),
        (Err(e), _) | (_, Err(e)) => {
            return Json(QuestionsResponse {
                video_id,
                questions: Vec::new(),
                total_questions: 0,
                chunk_distribution: Vec::new(),
                max_questions,
                error: Some(e.to_string()),
            })
            .into_response();
        }
    };

    let total_questions = questions.len();
    state
        .trigger
        .on_read(&video_id, total_questions as u32)
        .await;

    Json(QuestionsResponse {
        video_id,
        questions,
        total_questions,
        chunk_distribution: distribution,
        max_questions,
        error: None,
    })
    .into_response()
}

async fn generate_questions(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    body: Option<Json<GenerateRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    match state
        .pipeline
        .generate_manual(&video_id, req.target_chunks.as_deref(), req.question_count)
        .await
    {
        Ok(outcome) if outcome.at_cap => Json(AtCapResponse {
            message: "Maximum questions already reached".to_string(),
            current_count: outcome.total,
        })
        .into_response(),
        Ok(outcome) => Json(GenerateResponse {
            success: true,
            message: format!("Generated {} new questions", outcome.inserted),
            total_questions: outcome.total,
            questions_generated: outcome.generated,
        })
        .into_response(),
        Err(e) => generation_error(e),
    }
}

async fn question_analytics(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    match state.pipeline.analytics(&video_id).await {
        Ok(report) => Json(AnalyticsResponse {
            video_id: report.video_id,
            chunk_coverage: report.chunk_coverage,
            potential_duplicates: report
                .potential_duplicates
                .into_iter()
                .map(|g| DuplicateInfo {
                    dedup_hash: g.dedup_hash,
                    questions: g.questions,
                })
                .collect(),
            recommendation: report.recommendation,
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn reset_questions(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
) -> impl IntoResponse {
    match state.pipeline.reset_and_regenerate(&video_id).await {
        Ok(outcome) => Json(ResetResponse {
            success: true,
            message: format!("Generated {} new questions", outcome.inserted),
            total_questions: outcome.total,
        })
        .into_response(),
        Err(e) => generation_error(e),
    }
}

/// Map pipeline errors to the status codes the platform expects.
fn generation_error(e: FrageError) -> axum::response::Response {
    match e {
        FrageError::VideoNotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Video not found".to_string(),
            }),
        )
            .into_response(),
        FrageError::NoTranscript(_) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No content available for question generation".to_string(),
            }),
        )
            .into_response(),
        FrageError::GenerationBusy(_) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: "Generation already in progress".to_string(),
            }),
        )
            .into_response(),
        e => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}
