//! Axum route handlers for the wizard API.
//!
//! Handlers that call the model lock the session, begin the request, release
//! the lock for the model call, then re-lock and complete with the ticket.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::layout::{
    answer_key_filename, render_student_document, render_teacher_document, worksheet_filename,
    RenderedPdf,
};
use crate::lessons::{discover_content, generate_lesson, grade_answers};
use crate::models::{CefrLevel, Difficulty, Language, Topic};
use crate::state::AppState;
use crate::wizard::machine::DiscoveryJob;
use crate::wizard::session::SessionHandle;
use crate::wizard::view::SessionView;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: Language,
}

#[derive(Debug, Deserialize)]
pub struct LevelRequest {
    pub level: CefrLevel,
}

#[derive(Debug, Deserialize)]
pub struct TopicsRequest {
    pub topics: Vec<Topic>,
}

#[derive(Debug, Deserialize)]
pub struct DifficultyRequest {
    pub difficulty: Difficulty,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub languages: Vec<LanguageEntry>,
    pub topics: Vec<TopicEntry>,
    pub difficulties: Vec<DifficultyEntry>,
}

#[derive(Debug, Serialize)]
pub struct LanguageEntry {
    pub language: Language,
    pub endonym: &'static str,
    pub levels: Vec<LevelEntry>,
}

#[derive(Debug, Serialize)]
pub struct LevelEntry {
    pub level: CefrLevel,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TopicEntry {
    pub topic: Topic,
    pub canonical: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DifficultyEntry {
    pub difficulty: Difficulty,
    pub band: &'static str,
    pub adjustment: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog & session lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/catalog
pub async fn handle_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        languages: Language::ALL
            .iter()
            .map(|&language| LanguageEntry {
                language,
                endonym: language.endonym(),
                levels: language
                    .offered_levels()
                    .iter()
                    .map(|&level| LevelEntry {
                        level,
                        description: level.description(),
                    })
                    .collect(),
            })
            .collect(),
        topics: Topic::ALL
            .iter()
            .map(|&topic| TopicEntry {
                topic,
                canonical: topic.canonical(),
            })
            .collect(),
        difficulties: Difficulty::ALL
            .iter()
            .map(|&difficulty| DifficultyEntry {
                difficulty,
                band: difficulty.band(),
                adjustment: difficulty.adjustment(),
            })
            .collect(),
    })
}

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionView>) {
    let handle = state.sessions.create().await;
    let session = handle.lock().await;
    (StatusCode::CREATED, Json(SessionView::from(&*session)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let session = handle.lock().await;
    Ok(Json(SessionView::from(&*session)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Navigation
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/language
pub async fn handle_choose_language(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LanguageRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.wizard.choose_language(req.language)?;
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/level
pub async fn handle_choose_level(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<LevelRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.wizard.choose_level(req.level)?;
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/items/:index
pub async fn handle_select_item(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.wizard.select_item(index)?;
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/back
pub async fn handle_back(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.wizard.back();
    Ok(Json(SessionView::from(&*session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Model-backed operations
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/topics
///
/// Enters the dashboard and fetches the first batch of items.
pub async fn handle_confirm_topics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TopicsRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let job = handle.lock().await.wizard.confirm_topics(&req.topics)?;
    run_discovery(&state, &handle, job).await
}

/// POST /api/v1/sessions/:id/refresh
pub async fn handle_refresh(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let job = handle.lock().await.wizard.refresh()?;
    run_discovery(&state, &handle, job).await
}

async fn run_discovery(
    state: &AppState,
    handle: &SessionHandle,
    job: DiscoveryJob,
) -> Result<Json<SessionView>, AppError> {
    let result =
        discover_content(state.model.as_ref(), job.language, job.level, &job.topics).await;

    let mut session = handle.lock().await;
    session.wizard.complete_discovery(job.ticket, result)?;
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/lesson
///
/// Records the difficulty tier and generates the exercises for the open item.
pub async fn handle_generate_lesson(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DifficultyRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let job = handle.lock().await.wizard.choose_difficulty(req.difficulty)?;

    let result = generate_lesson(state.model.as_ref(), &job.item, job.difficulty, job.language).await;

    let mut session = handle.lock().await;
    session.wizard.complete_generation(job.ticket, result)?;
    Ok(Json(SessionView::from(&*session)))
}

/// PUT /api/v1/sessions/:id/answers/:question_id
pub async fn handle_record_answer(
    State(state): State<AppState>,
    Path((id, question_id)): Path<(Uuid, String)>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.wizard.record_answer(&question_id, &req.text)?;
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/submit
///
/// Grades the submitted answers. Grading never fails; degraded feedback
/// falls back to the model answers.
pub async fn handle_submit_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let job = handle.lock().await.wizard.submit_answers()?;

    let feedback = grade_answers(
        state.model.as_ref(),
        &job.item,
        &job.questions,
        &job.answers,
        job.language,
        &state.config.feedback_language,
    )
    .await;

    let mut session = handle.lock().await;
    session.wizard.complete_grading(job.ticket, feedback);
    Ok(Json(SessionView::from(&*session)))
}

/// POST /api/v1/sessions/:id/reset
pub async fn handle_reset_answers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let handle = state.sessions.get(id).await?;
    let mut session = handle.lock().await;
    session.wizard.reset_answers()?;
    Ok(Json(SessionView::from(&*session)))
}

// ────────────────────────────────────────────────────────────────────────────
// Export
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum ExportKind {
    Worksheet,
    AnswerKey,
}

/// GET /api/v1/sessions/:id/worksheet.pdf
pub async fn handle_worksheet_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    export(&state, id, ExportKind::Worksheet).await
}

/// GET /api/v1/sessions/:id/answer-key.pdf
pub async fn handle_answer_key_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    export(&state, id, ExportKind::AnswerKey).await
}

async fn export(state: &AppState, id: Uuid, kind: ExportKind) -> Result<Response, AppError> {
    let handle = state.sessions.get(id).await?;
    let source = handle.lock().await.wizard.export_source()?;

    // Layout and serialization are CPU-bound.
    let pdf = tokio::task::spawn_blocking(move || -> anyhow::Result<RenderedPdf> {
        let (document, filename) = match kind {
            ExportKind::Worksheet => (
                render_student_document(&source.lesson, &source.item, source.language),
                worksheet_filename(source.language, &source.item.date),
            ),
            ExportKind::AnswerKey => (
                render_teacher_document(&source.lesson, &source.item, source.language),
                answer_key_filename(source.language, &source.item.date),
            ),
        };
        let bytes = document.to_pdf()?;
        Ok(RenderedPdf {
            filename,
            bytes: bytes.into(),
        })
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in export: {e}")))??;

    info!(
        "Exported {} ({} bytes)",
        pdf.filename,
        pdf.bytes.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&pdf.filename),
            ),
        ],
        pdf.bytes,
    )
        .into_response())
}

/// Attachment header for `filename`. Control characters are dropped; the
/// plain `filename` carries an ASCII fallback and `filename*` the exact name
/// (RFC 5987), since dates from the model may be non-ASCII.
fn content_disposition(filename: &str) -> String {
    let cleaned: String = filename.chars().filter(|c| !c.is_control()).collect();
    let fallback: String = cleaned
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(&cleaned)
    )
}
