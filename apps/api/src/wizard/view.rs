//! JSON views of a session. Views are pure functions of the wizard state and
//! never carry model answers; those only appear in the teacher PDF.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{
    AnswerSet, CefrLevel, ContentItem, Difficulty, FeedbackSet, Language, LessonGoal,
    QuestionKind, Topic,
};
use crate::wizard::machine::{Detail, RequestKind, Step};
use crate::wizard::session::Session;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub step: &'static str,
    pub loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<CefrLevel>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<Topic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<ItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailView>,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub index: usize,
    #[serde(flatten)]
    pub item: ContentItem,
}

#[derive(Debug, Serialize)]
pub struct DetailView {
    pub index: usize,
    pub item: ContentItem,
    pub difficulty: Option<Difficulty>,
    pub lesson: Option<LessonView>,
    pub answers: AnswerSet,
    pub submitted: bool,
    pub feedback: Option<FeedbackSet>,
}

#[derive(Debug, Serialize)]
pub struct LessonView {
    pub goal: LessonGoal,
    pub questions: Vec<QuestionView>,
}

/// A question as the student sees it.
#[derive(Debug, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub kind: QuestionKind,
    pub label: String,
    pub instruction: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        let wizard = &session.wizard;
        let mut view = SessionView {
            id: session.id,
            created_at: session.created_at,
            step: wizard.step().name(),
            loading: wizard.is_loading(),
            pending: wizard.pending().map(|kind| match kind {
                RequestKind::Discovery => "discovery",
                RequestKind::Generation => "generation",
                RequestKind::Grading => "grading",
            }),
            error: wizard.error().map(str::to_string),
            language: wizard.language(),
            level: None,
            topics: Vec::new(),
            headline: None,
            items: Vec::new(),
            detail: None,
        };

        match wizard.step() {
            Step::Language | Step::Level { .. } => {}
            Step::Topics { level, .. } => view.level = Some(*level),
            Step::Dashboard(dashboard) => {
                view.level = Some(dashboard.selection.level);
                view.topics = dashboard.selection.topics.clone();
                view.headline = Some(dashboard.selection.headline());
                view.items = dashboard
                    .items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| ItemView {
                        index,
                        item: item.clone(),
                    })
                    .collect();
                view.detail = dashboard.detail.as_ref().map(DetailView::from);
            }
        }
        view
    }
}

impl From<&Detail> for DetailView {
    fn from(detail: &Detail) -> Self {
        DetailView {
            index: detail.index,
            item: detail.item.clone(),
            difficulty: detail.difficulty,
            lesson: detail.lesson.as_ref().map(|lesson| LessonView {
                goal: lesson.goal.clone(),
                questions: lesson
                    .questions
                    .iter()
                    .map(|q| QuestionView {
                        id: q.id.clone(),
                        kind: q.kind,
                        label: q.type_label.clone(),
                        instruction: q.instruction.clone(),
                        question: q.prompt.clone(),
                        options: q.options.clone(),
                    })
                    .collect(),
            }),
            answers: detail.answers.clone(),
            submitted: detail.submitted,
            feedback: detail.feedback.clone(),
        }
    }
}
