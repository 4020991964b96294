// Content/Lesson Request Façade.
// Implements: content discovery, exercise generation, answer grading.
// All model calls go through llm_client. No direct Gemini calls here.

pub mod discovery;
pub mod generator;
pub mod grading;
pub mod prompts;

use thiserror::Error;

use crate::llm_client::LlmError;

pub use discovery::discover_content;
pub use generator::generate_lesson;
pub use grading::grade_answers;

/// Discovery call failed or its response did not match the discovery schema.
#[derive(Debug, Error)]
pub enum ContentFetchError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("response did not match the discovery schema: {0}")]
    Schema(String),
}

/// Generation call failed or its response did not match the lesson schema.
#[derive(Debug, Error)]
pub enum LessonGenerationError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("response did not match the lesson schema: {0}")]
    Schema(String),
}
