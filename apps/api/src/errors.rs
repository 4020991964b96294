use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::lessons::{ContentFetchError, LessonGenerationError};
use crate::wizard::machine::WizardError;

/// User-facing message for a failed discovery call.
pub const CONTENT_FETCH_MESSAGE: &str =
    "Failed to fetch new content. Please check your internet connection or API key.";

/// User-facing message for a failed generation call.
pub const LESSON_GENERATION_MESSAGE: &str = "Failed to generate exercises. Please try again.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Content discovery failed: {0}")]
    ContentFetch(#[from] ContentFetchError),

    #[error("Lesson generation failed: {0}")]
    LessonGeneration(#[from] LessonGenerationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        match err {
            WizardError::InvalidTransition { .. }
            | WizardError::RequestInFlight
            | WizardError::AnswersLocked => AppError::Conflict(err.to_string()),
            WizardError::NoSuchItem { .. } | WizardError::UnknownQuestion(_) => {
                AppError::NotFound(err.to_string())
            }
            WizardError::TooFewTopics { .. }
            | WizardError::LevelNotOffered { .. }
            | WizardError::Unanswered { .. }
            | WizardError::NothingToExport => AppError::Validation(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::ContentFetch(e) => {
                tracing::error!("Content discovery error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    CONTENT_FETCH_MESSAGE.to_string(),
                )
            }
            AppError::LessonGeneration(e) => {
                tracing::error!("Lesson generation error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    LESSON_GENERATION_MESSAGE.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
