//! Lesson generation: turns one content item into a goal and five questions.
//!
//! The returned plan is validated against the lesson schema before use:
//! exactly 2 multiple-choice and 3 open questions, unique ids, options on every
//! multiple-choice question and a model answer on every question.

use std::collections::HashSet;

use tracing::{info, instrument};

use crate::lessons::discovery::tutor_system_instruction;
use crate::lessons::prompts::GENERATION_PROMPT_TEMPLATE;
use crate::lessons::LessonGenerationError;
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{call_json, GenerationRequest, GenerativeModel};
use crate::models::{ContentItem, ContentKind, Difficulty, Language, LessonPlan, QuestionKind};

pub const MULTIPLE_CHOICE_COUNT: usize = 2;
pub const OPEN_COUNT: usize = 3;

const GENERATION_TEMPERATURE: f32 = 0.7;

/// Generates a lesson plan for `item` at the given difficulty tier.
#[instrument(skip_all, fields(language = %language, difficulty = difficulty.number()))]
pub async fn generate_lesson(
    model: &dyn GenerativeModel,
    item: &ContentItem,
    difficulty: Difficulty,
    language: Language,
) -> Result<LessonPlan, LessonGenerationError> {
    let request = build_generation_request(item, difficulty, language);

    let lesson: LessonPlan = call_json(model, &request).await?;
    validate_lesson(&lesson)?;

    info!(
        "Generated lesson with {} questions for {:?}",
        lesson.questions.len(),
        item.title.chars().take(60).collect::<String>()
    );
    Ok(lesson)
}

pub(crate) fn build_generation_request(
    item: &ContentItem,
    difficulty: Difficulty,
    language: Language,
) -> GenerationRequest {
    let kind = match item.kind {
        ContentKind::Article => "article",
        ContentKind::Video => "video",
    };
    let number = difficulty.number().to_string();

    GenerationRequest {
        system_instruction: tutor_system_instruction(language),
        user_prompt: fill_template(
            GENERATION_PROMPT_TEMPLATE,
            &[
                ("kind", kind),
                ("title", &item.title),
                ("source", &item.source),
                ("date", &item.date),
                ("url", &item.url),
                ("summary", &item.summary),
                ("difficulty", &number),
                ("band", difficulty.band()),
                ("adjustment", difficulty.adjustment()),
                ("language", language.name()),
            ],
        ),
        temperature: GENERATION_TEMPERATURE,
        json_response: true,
        search_grounding: false,
    }
}

/// Checks a parsed plan against the lesson schema.
pub fn validate_lesson(lesson: &LessonPlan) -> Result<(), LessonGenerationError> {
    let schema = |msg: String| Err(LessonGenerationError::Schema(msg));

    let multiple_choice = lesson
        .questions
        .iter()
        .filter(|q| q.kind == QuestionKind::MultipleChoice)
        .count();
    let open = lesson.questions.len() - multiple_choice;

    if multiple_choice != MULTIPLE_CHOICE_COUNT || open != OPEN_COUNT {
        return schema(format!(
            "expected {MULTIPLE_CHOICE_COUNT} multiple-choice and {OPEN_COUNT} open questions, \
             got {multiple_choice} and {open}"
        ));
    }

    let mut ids = HashSet::new();
    for question in &lesson.questions {
        if question.id.trim().is_empty() {
            return schema("question without id".to_string());
        }
        if !ids.insert(question.id.as_str()) {
            return schema(format!("duplicate question id {:?}", question.id));
        }
        if question.prompt.trim().is_empty() {
            return schema(format!("question {:?} has no text", question.id));
        }
        if question.model_answer.trim().is_empty() {
            return schema(format!("question {:?} has no model answer", question.id));
        }
        if question.kind == QuestionKind::MultipleChoice
            && question.options.as_ref().map_or(true, |o| o.is_empty())
        {
            return schema(format!(
                "multiple-choice question {:?} has no options",
                question.id
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::fixtures;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::LlmError;

    #[tokio::test]
    async fn test_generates_valid_lesson() {
        let model = ScriptedModel::new().reply(fixtures::lesson_json());
        let lesson = generate_lesson(&model, &fixtures::item(1), Difficulty::Two, Language::English)
            .await
            .unwrap();
        assert_eq!(lesson, fixtures::lesson());
    }

    #[tokio::test]
    async fn test_prompt_embeds_item_and_tier() {
        let model = ScriptedModel::new().reply(fixtures::lesson_json());
        let item = fixtures::item(2);
        generate_lesson(&model, &item, Difficulty::Three, Language::Spanish)
            .await
            .unwrap();

        let request = &model.requests()[0];
        assert!(request.user_prompt.contains(&item.title));
        assert!(request.user_prompt.contains(&item.url));
        assert!(request.user_prompt.contains("contentType: \"video\""));
        assert!(request.user_prompt.contains("Level 3 (B1+ / low B2) in Spanish"));
        assert!(request.json_response);
        assert!(!request.search_grounding);
    }

    #[tokio::test]
    async fn test_empty_response_is_generation_error() {
        let model = ScriptedModel::new().reply("");
        let result =
            generate_lesson(&model, &fixtures::item(1), Difficulty::One, Language::German).await;
        assert!(matches!(
            result,
            Err(LessonGenerationError::Llm(LlmError::EmptyContent))
        ));
    }

    #[tokio::test]
    async fn test_malformed_response_is_generation_error() {
        let model = ScriptedModel::new().reply(r#"{"canDo": {"skill": "Reading"}}"#);
        let result =
            generate_lesson(&model, &fixtures::item(1), Difficulty::One, Language::German).await;
        assert!(matches!(result, Err(LessonGenerationError::Llm(LlmError::Parse(_)))));
    }

    #[test]
    fn test_wrong_question_mix_is_rejected() {
        let mut lesson = fixtures::lesson();
        lesson.questions[2].kind = QuestionKind::MultipleChoice;
        lesson.questions[2].options = Some(vec!["A) yes".to_string()]);
        assert!(matches!(
            validate_lesson(&lesson),
            Err(LessonGenerationError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_question_is_rejected() {
        let mut lesson = fixtures::lesson();
        lesson.questions.pop();
        assert!(validate_lesson(&lesson).is_err());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut lesson = fixtures::lesson();
        lesson.questions[4].id = "q1".to_string();
        assert!(validate_lesson(&lesson).is_err());
    }

    #[test]
    fn test_multiple_choice_without_options_is_rejected() {
        let mut lesson = fixtures::lesson();
        lesson.questions[0].options = Some(vec![]);
        assert!(validate_lesson(&lesson).is_err());
        lesson.questions[0].options = None;
        assert!(validate_lesson(&lesson).is_err());
    }

    #[test]
    fn test_blank_model_answer_is_rejected() {
        let mut lesson = fixtures::lesson();
        lesson.questions[3].model_answer = "  ".to_string();
        assert!(validate_lesson(&lesson).is_err());
    }
}
