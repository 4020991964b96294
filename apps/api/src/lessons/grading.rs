//! Answer grading. The only façade call with a fallback.
//!
//! Grading runs after the student has committed answers, so it never fails:
//! every question id of the lesson gets exactly one feedback string, taken from
//! the model when available and synthesized from the model answer otherwise.

use std::collections::BTreeMap;

use serde_json::json;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::lessons::prompts::{GRADING_PROMPT_TEMPLATE, GRADING_SYSTEM_TEMPLATE};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{call_json, GenerationRequest, GenerativeModel};
use crate::models::{AnswerSet, ContentItem, FeedbackSet, Language, Question, QuestionKind};

const GRADING_TEMPERATURE: f32 = 0.3;

/// Grading fell back to model answers for some or all questions.
/// Logged, never surfaced to the user as an error.
#[derive(Debug, Error)]
#[error("grading degraded: {fallback_count} of {total} questions fell back to the model answer ({cause})")]
pub struct GradingDegraded {
    pub fallback_count: usize,
    pub total: usize,
    pub cause: String,
}

/// Grades `answers` against `questions`; always returns one entry per question id.
#[instrument(skip_all, fields(language = %language, questions = questions.len()))]
pub async fn grade_answers(
    model: &dyn GenerativeModel,
    item: &ContentItem,
    questions: &[Question],
    answers: &AnswerSet,
    language: Language,
    feedback_language: &str,
) -> FeedbackSet {
    let request = build_grading_request(item, questions, answers, language, feedback_language);

    match call_json::<BTreeMap<String, String>>(model, &request).await {
        Ok(generated) => merge_feedback(questions, generated),
        Err(e) => {
            let degraded = GradingDegraded {
                fallback_count: questions.len(),
                total: questions.len(),
                cause: e.to_string(),
            };
            warn!("{degraded}");
            questions
                .iter()
                .map(|q| (q.id.clone(), fallback_feedback(q)))
                .collect()
        }
    }
}

/// Feedback shown for a question the model could not grade.
pub fn fallback_feedback(question: &Question) -> String {
    format!("Grading unavailable. Model answer: {}", question.model_answer)
}

/// Keeps generated feedback for known ids, falls back for missing or blank
/// ones, and drops ids that are not part of the lesson.
fn merge_feedback(questions: &[Question], mut generated: BTreeMap<String, String>) -> FeedbackSet {
    let mut missing = 0usize;
    let feedback: FeedbackSet = questions
        .iter()
        .map(|q| {
            let text = match generated.remove(&q.id) {
                Some(text) if !text.trim().is_empty() => text,
                _ => {
                    missing += 1;
                    fallback_feedback(q)
                }
            };
            (q.id.clone(), text)
        })
        .collect();

    if !generated.is_empty() {
        warn!(
            "Dropping feedback for {} unknown question ids",
            generated.len()
        );
    }

    if missing > 0 {
        let degraded = GradingDegraded {
            fallback_count: missing,
            total: questions.len(),
            cause: "response omitted some question ids".to_string(),
        };
        warn!("{degraded}");
    } else {
        info!("Graded {} answers", questions.len());
    }

    feedback
}

pub(crate) fn build_grading_request(
    item: &ContentItem,
    questions: &[Question],
    answers: &AnswerSet,
    language: Language,
    feedback_language: &str,
) -> GenerationRequest {
    let questions_json = json!(questions
        .iter()
        .map(|q| json!({
            "id": q.id,
            "question": q.prompt,
            "correctAnswer": q.model_answer,
            "type": match q.kind {
                QuestionKind::MultipleChoice => "multiple_choice",
                QuestionKind::Open => "open",
            },
            "label": q.type_label,
            "options": q.options,
        }))
        .collect::<Vec<_>>())
    .to_string();
    let answers_json = json!(answers).to_string();

    GenerationRequest {
        system_instruction: fill_template(
            GRADING_SYSTEM_TEMPLATE,
            &[("feedback_language", feedback_language)],
        ),
        user_prompt: fill_template(
            GRADING_PROMPT_TEMPLATE,
            &[
                ("language", language.name()),
                ("title", &item.title),
                ("summary", &item.summary),
                ("questions_json", &questions_json),
                ("answers_json", &answers_json),
                ("feedback_language", feedback_language),
            ],
        ),
        temperature: GRADING_TEMPERATURE,
        json_response: true,
        search_grounding: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::fixtures;
    use crate::llm_client::testing::ScriptedModel;

    fn answers() -> AnswerSet {
        fixtures::lesson()
            .questions
            .iter()
            .map(|q| (q.id.clone(), format!("my answer to {}", q.id)))
            .collect()
    }

    #[tokio::test]
    async fn test_feedback_keyed_by_question_ids() {
        let lesson = fixtures::lesson();
        let reply = json!({
            "q1": "Stap 1: Controle\nJa.",
            "q2": "Stap 1: Controle\nNee.",
            "q3": "Stap 1: Controle\nJa.",
            "q4": "Stap 1: Controle\nJa.",
            "q5": "Stap 1: Controle\nJa.",
        })
        .to_string();
        let model = ScriptedModel::new().reply(reply);

        let feedback = grade_answers(
            &model,
            &fixtures::item(1),
            &lesson.questions,
            &answers(),
            Language::English,
            "Dutch",
        )
        .await;

        let keys: Vec<&str> = feedback.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["q1", "q2", "q3", "q4", "q5"]);
        assert_eq!(feedback["q2"], "Stap 1: Controle\nNee.");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_model_answers() {
        let lesson = fixtures::lesson();
        let model = ScriptedModel::new().fail(500);

        let feedback = grade_answers(
            &model,
            &fixtures::item(1),
            &lesson.questions,
            &answers(),
            Language::English,
            "Dutch",
        )
        .await;

        assert_eq!(feedback.len(), lesson.questions.len());
        for q in &lesson.questions {
            assert!(feedback[&q.id].contains(&q.model_answer));
        }
    }

    #[tokio::test]
    async fn test_unparsable_response_falls_back() {
        let lesson = fixtures::lesson();
        let model = ScriptedModel::new().reply("Great work everyone!");

        let feedback = grade_answers(
            &model,
            &fixtures::item(1),
            &lesson.questions,
            &answers(),
            Language::French,
            "Dutch",
        )
        .await;

        assert_eq!(feedback.len(), 5);
        assert!(feedback["q4"].starts_with("Grading unavailable."));
    }

    #[tokio::test]
    async fn test_partial_response_fills_missing_ids_and_drops_unknown() {
        let lesson = fixtures::lesson();
        let reply = json!({ "q1": "Goed gedaan.", "q9": "Not a question of this lesson" }).to_string();
        let model = ScriptedModel::new().reply(reply);

        let feedback = grade_answers(
            &model,
            &fixtures::item(1),
            &lesson.questions,
            &answers(),
            Language::English,
            "Dutch",
        )
        .await;

        assert_eq!(feedback.len(), 5);
        assert_eq!(feedback["q1"], "Goed gedaan.");
        assert!(!feedback.contains_key("q9"));
        assert!(feedback["q3"].contains(&lesson.questions[2].model_answer));
    }

    #[test]
    fn test_grading_prompt_embeds_answers_and_feedback_language() {
        let lesson = fixtures::lesson();
        let request = build_grading_request(
            &fixtures::item(1),
            &lesson.questions,
            &answers(),
            Language::German,
            "Dutch",
        );
        assert!(request.user_prompt.contains("my answer to q3"));
        assert!(request.user_prompt.contains(&lesson.questions[0].model_answer));
        assert!(request.user_prompt.contains("Write in Dutch"));
        assert!(request.user_prompt.contains("for a German class"));
        assert!(request.system_instruction.contains("feedback in Dutch"));
    }
}
