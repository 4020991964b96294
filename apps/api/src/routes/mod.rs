pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::wizard::handlers;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/catalog", get(handlers::handle_catalog))
        // Wizard sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/language",
            post(handlers::handle_choose_language),
        )
        .route(
            "/api/v1/sessions/:id/level",
            post(handlers::handle_choose_level),
        )
        .route(
            "/api/v1/sessions/:id/topics",
            post(handlers::handle_confirm_topics),
        )
        .route(
            "/api/v1/sessions/:id/refresh",
            post(handlers::handle_refresh),
        )
        .route(
            "/api/v1/sessions/:id/items/:index",
            post(handlers::handle_select_item),
        )
        .route(
            "/api/v1/sessions/:id/lesson",
            post(handlers::handle_generate_lesson),
        )
        .route(
            "/api/v1/sessions/:id/answers/:question_id",
            put(handlers::handle_record_answer),
        )
        .route(
            "/api/v1/sessions/:id/submit",
            post(handlers::handle_submit_answers),
        )
        .route(
            "/api/v1/sessions/:id/reset",
            post(handlers::handle_reset_answers),
        )
        .route("/api/v1/sessions/:id/back", post(handlers::handle_back))
        // Export
        .route(
            "/api/v1/sessions/:id/worksheet.pdf",
            get(handlers::handle_worksheet_pdf),
        )
        .route(
            "/api/v1/sessions/:id/answer-key.pdf",
            get(handlers::handle_answer_key_pdf),
        )
        .with_state(state)
}
