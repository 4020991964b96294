//! Wizard state machine: language → level → topics → dashboard, with an item
//! detail nested inside the dashboard and a single `back` operation.
//!
//! All mutation goes through the transition methods on [`Wizard`]. Operations
//! that need the generative model are split in two: a `begin` half that
//! validates, updates state and hands out a [`Ticket`], and a `complete_*` half
//! that applies the result only if the ticket is still the one in flight.
//! Navigation invalidates the in-flight ticket, so late results are dropped.

use thiserror::Error;
use tracing::{debug, info};

use crate::errors::{CONTENT_FETCH_MESSAGE, LESSON_GENERATION_MESSAGE};
use crate::lessons::{ContentFetchError, LessonGenerationError};
use crate::models::{
    dedup_topics, AnswerSet, CefrLevel, ContentItem, Difficulty, FeedbackSet, Language,
    LessonPlan, Question, Selection, Topic, MIN_TOPICS,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("cannot {operation} while on the {step} step")]
    InvalidTransition {
        operation: &'static str,
        step: &'static str,
    },

    #[error("select at least {required} distinct topics (got {found})")]
    TooFewTopics { found: usize, required: usize },

    #[error("level {level} is not offered for {language}")]
    LevelNotOffered { language: Language, level: CefrLevel },

    #[error("no item at position {index} (batch has {available})")]
    NoSuchItem { index: usize, available: usize },

    #[error("another request is still in progress")]
    RequestInFlight,

    #[error("question {0:?} is not part of this lesson")]
    UnknownQuestion(String),

    #[error("answers were already submitted; reset to try again")]
    AnswersLocked,

    #[error("answer every question before submitting (missing: {})", .missing.join(", "))]
    Unanswered { missing: Vec<String> },

    #[error("no lesson has been generated yet")]
    NothingToExport,
}

// ────────────────────────────────────────────────────────────────────────────
// State
// ────────────────────────────────────────────────────────────────────────────

/// Current wizard step and the payload that step owns.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Language,
    Level { language: Language },
    Topics { language: Language, level: CefrLevel },
    Dashboard(Dashboard),
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Language => "language",
            Step::Level { .. } => "level",
            Step::Topics { .. } => "topics",
            Step::Dashboard(_) => "dashboard",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub selection: Selection,
    pub items: Vec<ContentItem>,
    pub detail: Option<Detail>,
}

/// The item the teacher opened, and everything built on top of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub index: usize,
    pub item: ContentItem,
    pub difficulty: Option<Difficulty>,
    pub lesson: Option<LessonPlan>,
    pub answers: AnswerSet,
    pub feedback: Option<FeedbackSet>,
    pub submitted: bool,
}

impl Detail {
    fn new(index: usize, item: ContentItem) -> Self {
        Self {
            index,
            item,
            difficulty: None,
            lesson: None,
            answers: AnswerSet::new(),
            feedback: None,
            submitted: false,
        }
    }

    fn clear_attempt(&mut self) {
        self.answers.clear();
        self.feedback = None;
        self.submitted = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Discovery,
    Generation,
    Grading,
}

/// Identifies one outbound request. Only the ticket currently in flight may
/// apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    id: u64,
    kind: RequestKind,
}

#[cfg(test)]
impl Ticket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

/// Whether a completion changed the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

/// Inputs of a discovery call issued by the wizard.
#[derive(Debug, Clone)]
pub struct DiscoveryJob {
    pub ticket: Ticket,
    pub language: Language,
    pub level: CefrLevel,
    pub topics: Vec<Topic>,
}

/// Inputs of a generation call issued by the wizard.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    pub ticket: Ticket,
    pub item: ContentItem,
    pub difficulty: Difficulty,
    pub language: Language,
}

/// Inputs of a grading call. `answers` is a snapshot taken at submission.
#[derive(Debug, Clone)]
pub struct GradingJob {
    pub ticket: Ticket,
    pub item: ContentItem,
    pub questions: Vec<Question>,
    pub answers: AnswerSet,
    pub language: Language,
}

/// What a PDF export needs, cloned out of the detail view.
#[derive(Debug, Clone)]
pub struct ExportSource {
    pub lesson: LessonPlan,
    pub item: ContentItem,
    pub language: Language,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    in_flight: Option<Ticket>,
    last_ticket: u64,
    error: Option<String>,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new()
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self {
            step: Step::Language,
            in_flight: None,
            last_ticket: 0,
            error: None,
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn pending(&self) -> Option<RequestKind> {
        self.in_flight.map(|t| t.kind)
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Language of the session, once chosen.
    pub fn language(&self) -> Option<Language> {
        match &self.step {
            Step::Language => None,
            Step::Level { language } | Step::Topics { language, .. } => Some(*language),
            Step::Dashboard(d) => Some(d.selection.language),
        }
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    pub fn choose_language(&mut self, language: Language) -> Result<(), WizardError> {
        match self.step {
            Step::Language => {
                self.navigate(Step::Level { language });
                Ok(())
            }
            _ => Err(self.invalid("choose a language")),
        }
    }

    pub fn choose_level(&mut self, level: CefrLevel) -> Result<(), WizardError> {
        let Step::Level { language } = self.step else {
            return Err(self.invalid("choose a level"));
        };
        if !language.offered_levels().contains(&level) {
            return Err(WizardError::LevelNotOffered { language, level });
        }
        self.navigate(Step::Topics { language, level });
        Ok(())
    }

    /// Moves to the dashboard and issues the first discovery request.
    pub fn confirm_topics(&mut self, topics: &[Topic]) -> Result<DiscoveryJob, WizardError> {
        let Step::Topics { language, level } = self.step else {
            return Err(self.invalid("confirm topics"));
        };
        let topics = dedup_topics(topics);
        if topics.len() < MIN_TOPICS {
            return Err(WizardError::TooFewTopics {
                found: topics.len(),
                required: MIN_TOPICS,
            });
        }

        self.navigate(Step::Dashboard(Dashboard {
            selection: Selection {
                language,
                level,
                topics: topics.clone(),
            },
            items: Vec::new(),
            detail: None,
        }));
        let ticket = self.begin(RequestKind::Discovery)?;

        Ok(DiscoveryJob {
            ticket,
            language,
            level,
            topics,
        })
    }

    pub fn select_item(&mut self, index: usize) -> Result<(), WizardError> {
        let Step::Dashboard(dashboard) = &self.step else {
            return Err(self.invalid("open an item"));
        };
        let item = dashboard
            .items
            .get(index)
            .cloned()
            .ok_or(WizardError::NoSuchItem {
                index,
                available: dashboard.items.len(),
            })?;

        self.invalidate();
        if let Step::Dashboard(dashboard) = &mut self.step {
            dashboard.detail = Some(Detail::new(index, item));
        }
        Ok(())
    }

    /// Steps back one level, discarding what the current step held.
    /// From the language step this is a no-op.
    pub fn back(&mut self) {
        let previous = match &mut self.step {
            Step::Language => return,
            Step::Level { .. } => Step::Language,
            Step::Topics { language, .. } => Step::Level {
                language: *language,
            },
            Step::Dashboard(dashboard) => {
                if dashboard.detail.take().is_some() {
                    // Back to the list: the fetched batch stays, no re-fetch.
                    self.invalidate();
                    return;
                }
                Step::Topics {
                    language: dashboard.selection.language,
                    level: dashboard.selection.level,
                }
            }
        };
        self.navigate(previous);
    }

    // ── Requests ───────────────────────────────────────────────────────────

    /// Re-issues discovery with the held selection.
    pub fn refresh(&mut self) -> Result<DiscoveryJob, WizardError> {
        let Step::Dashboard(dashboard) = &self.step else {
            return Err(self.invalid("refresh content"));
        };
        let selection = dashboard.selection.clone();
        let ticket = self.begin(RequestKind::Discovery)?;

        Ok(DiscoveryJob {
            ticket,
            language: selection.language,
            level: selection.level,
            topics: selection.topics,
        })
    }

    /// Records the tier, drops any previous lesson and issues generation.
    pub fn choose_difficulty(&mut self, difficulty: Difficulty) -> Result<GenerationJob, WizardError> {
        let Some((language, detail)) = self.detail() else {
            return Err(self.invalid("choose a difficulty"));
        };
        let item = detail.item.clone();
        if self.in_flight.is_some() {
            return Err(WizardError::RequestInFlight);
        }

        if let Some((_, detail)) = self.detail_mut() {
            detail.difficulty = Some(difficulty);
            detail.lesson = None;
            detail.clear_attempt();
        }
        let ticket = self.begin(RequestKind::Generation)?;

        Ok(GenerationJob {
            ticket,
            item,
            difficulty,
            language,
        })
    }

    pub fn record_answer(&mut self, question_id: &str, text: &str) -> Result<(), WizardError> {
        let Some((_, detail)) = self.detail_mut() else {
            return Err(self.invalid("answer a question"));
        };
        let Some(lesson) = &detail.lesson else {
            return Err(WizardError::UnknownQuestion(question_id.to_string()));
        };
        if lesson.question(question_id).is_none() {
            return Err(WizardError::UnknownQuestion(question_id.to_string()));
        }
        if detail.submitted {
            return Err(WizardError::AnswersLocked);
        }
        detail
            .answers
            .insert(question_id.to_string(), text.to_string());
        Ok(())
    }

    /// Locks the answers and issues grading on a snapshot of them.
    pub fn submit_answers(&mut self) -> Result<GradingJob, WizardError> {
        let Some((language, detail)) = self.detail() else {
            return Err(self.invalid("submit answers"));
        };
        let Some(lesson) = &detail.lesson else {
            return Err(WizardError::NothingToExport);
        };
        if detail.submitted {
            return Err(WizardError::AnswersLocked);
        }
        let missing: Vec<String> = lesson
            .questions
            .iter()
            .filter(|q| {
                detail
                    .answers
                    .get(&q.id)
                    .map_or(true, |a| a.trim().is_empty())
            })
            .map(|q| q.id.clone())
            .collect();
        if !missing.is_empty() {
            return Err(WizardError::Unanswered { missing });
        }
        if self.in_flight.is_some() {
            return Err(WizardError::RequestInFlight);
        }

        let job_item = detail.item.clone();
        let questions = lesson.questions.clone();
        let answers = detail.answers.clone();

        if let Some((_, detail)) = self.detail_mut() {
            detail.submitted = true;
        }
        let ticket = self.begin(RequestKind::Grading)?;

        Ok(GradingJob {
            ticket,
            item: job_item,
            questions,
            answers,
            language,
        })
    }

    /// Clears answers and feedback so the exercise can be retried.
    pub fn reset_answers(&mut self) -> Result<(), WizardError> {
        let Some((_, detail)) = self.detail_mut() else {
            return Err(self.invalid("reset answers"));
        };
        detail.clear_attempt();
        // A grading call still running belongs to the discarded attempt.
        if self.pending() == Some(RequestKind::Grading) {
            self.invalidate();
        }
        Ok(())
    }

    // ── Completions ────────────────────────────────────────────────────────

    /// Applies a discovery result. A successful batch replaces the previous
    /// one wholesale and closes any open item. On failure the batch is kept.
    pub fn complete_discovery(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<ContentItem>, ContentFetchError>,
    ) -> Result<Completion, ContentFetchError> {
        if !self.settle(ticket) {
            return Ok(Completion::Stale);
        }
        let Step::Dashboard(dashboard) = &mut self.step else {
            return Ok(Completion::Stale);
        };
        match result {
            Ok(items) => {
                info!("Dashboard now holds {} items", items.len());
                dashboard.items = items;
                dashboard.detail = None;
                Ok(Completion::Applied)
            }
            Err(e) => {
                self.error = Some(CONTENT_FETCH_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    pub fn complete_generation(
        &mut self,
        ticket: Ticket,
        result: Result<LessonPlan, LessonGenerationError>,
    ) -> Result<Completion, LessonGenerationError> {
        if !self.settle(ticket) {
            return Ok(Completion::Stale);
        }
        let Some((_, detail)) = self.detail_mut() else {
            return Ok(Completion::Stale);
        };
        match result {
            Ok(lesson) => {
                detail.lesson = Some(lesson);
                Ok(Completion::Applied)
            }
            Err(e) => {
                self.error = Some(LESSON_GENERATION_MESSAGE.to_string());
                Err(e)
            }
        }
    }

    /// Applies grading feedback all at once.
    pub fn complete_grading(&mut self, ticket: Ticket, feedback: FeedbackSet) -> Completion {
        if !self.settle(ticket) {
            return Completion::Stale;
        }
        match self.detail_mut() {
            Some((_, detail)) if detail.submitted => {
                detail.feedback = Some(feedback);
                Completion::Applied
            }
            _ => Completion::Stale,
        }
    }

    // ── Export ─────────────────────────────────────────────────────────────

    pub fn export_source(&self) -> Result<ExportSource, WizardError> {
        let (language, detail) = self.detail().ok_or(WizardError::NothingToExport)?;
        let lesson = detail.lesson.clone().ok_or(WizardError::NothingToExport)?;
        Ok(ExportSource {
            lesson,
            item: detail.item.clone(),
            language,
        })
    }

    // ── Internals ──────────────────────────────────────────────────────────

    fn detail(&self) -> Option<(Language, &Detail)> {
        match &self.step {
            Step::Dashboard(d) => d.detail.as_ref().map(|detail| (d.selection.language, detail)),
            _ => None,
        }
    }

    fn detail_mut(&mut self) -> Option<(Language, &mut Detail)> {
        match &mut self.step {
            Step::Dashboard(d) => {
                let language = d.selection.language;
                d.detail.as_mut().map(|detail| (language, detail))
            }
            _ => None,
        }
    }

    fn invalid(&self, operation: &'static str) -> WizardError {
        WizardError::InvalidTransition {
            operation,
            step: self.step.name(),
        }
    }

    fn navigate(&mut self, step: Step) {
        self.invalidate();
        self.step = step;
    }

    /// Drops the in-flight ticket; its result will be discarded.
    fn invalidate(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            debug!(ticket = ticket.id, kind = ?ticket.kind, "Discarding in-flight request");
        }
        self.error = None;
    }

    fn begin(&mut self, kind: RequestKind) -> Result<Ticket, WizardError> {
        if self.in_flight.is_some() {
            return Err(WizardError::RequestInFlight);
        }
        self.last_ticket += 1;
        let ticket = Ticket {
            id: self.last_ticket,
            kind,
        };
        self.in_flight = Some(ticket);
        self.error = None;
        Ok(ticket)
    }

    /// Clears the loading state if `ticket` is current. Returns false for
    /// stale tickets, which must not touch state.
    fn settle(&mut self, ticket: Ticket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            debug!(ticket = ticket.id, kind = ?ticket.kind, "Dropping stale result");
            false
        }
    }
}
