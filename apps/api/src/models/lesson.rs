//! Value records shared by the wizard, the lesson façade and the layout engine.
//!
//! Wire names follow the JSON the generative model is asked to produce
//! (`canDo`, `questionTypeLabel`, `correctAnswer`, ...).

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Language & CEFR level
// ────────────────────────────────────────────────────────────────────────────

/// Target language of the lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    English,
    French,
    German,
    Spanish,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::French,
        Language::German,
        Language::Spanish,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "French",
            Language::German => "German",
            Language::Spanish => "Spanish",
        }
    }

    /// The language's own name for itself, as shown on the language picker.
    pub fn endonym(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::French => "Français",
            Language::German => "Deutsch",
            Language::Spanish => "Español",
        }
    }

    /// CEFR levels a teacher may pick for this language.
    pub fn offered_levels(self) -> &'static [CefrLevel] {
        match self {
            Language::English => &[CefrLevel::A2, CefrLevel::B1, CefrLevel::B2, CefrLevel::C1],
            _ => &[CefrLevel::A1, CefrLevel::A2, CefrLevel::B1, CefrLevel::B2],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Common European Framework of Reference proficiency tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
}

impl CefrLevel {
    pub fn code(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CefrLevel::A1 => "Beginner (Breakthrough)",
            CefrLevel::A2 => "Elementary (Waystage)",
            CefrLevel::B1 => "Intermediate (Threshold)",
            CefrLevel::B2 => "Upper Intermediate (Vantage)",
            CefrLevel::C1 => "Advanced (Effective Proficiency)",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Topics
// ────────────────────────────────────────────────────────────────────────────

/// Topic catalogue, labelled in Dutch for the teachers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    #[serde(rename = "Natuur")]
    Nature,
    #[serde(rename = "Dieren")]
    Animals,
    #[serde(rename = "Sport")]
    Sports,
    #[serde(rename = "Hobby's")]
    Hobbies,
    #[serde(rename = "Politiek")]
    Politics,
    #[serde(rename = "Film en TV")]
    FilmAndTv,
    #[serde(rename = "Geschiedenis")]
    History,
    #[serde(rename = "Muziek")]
    Music,
    #[serde(rename = "Mode en Beauty")]
    FashionAndBeauty,
    #[serde(rename = "Gezondheid")]
    Health,
    #[serde(rename = "Lifestyle")]
    Lifestyle,
    #[serde(rename = "Reizen")]
    Travel,
    #[serde(rename = "Maatschappij en levensbeschouwing")]
    SocietyAndBeliefs,
}

impl Topic {
    pub const ALL: [Topic; 13] = [
        Topic::Nature,
        Topic::Animals,
        Topic::Sports,
        Topic::Hobbies,
        Topic::Politics,
        Topic::FilmAndTv,
        Topic::History,
        Topic::Music,
        Topic::FashionAndBeauty,
        Topic::Health,
        Topic::Lifestyle,
        Topic::Travel,
        Topic::SocietyAndBeliefs,
    ];

    /// Label shown to teachers.
    pub fn label(self) -> &'static str {
        match self {
            Topic::Nature => "Natuur",
            Topic::Animals => "Dieren",
            Topic::Sports => "Sport",
            Topic::Hobbies => "Hobby's",
            Topic::Politics => "Politiek",
            Topic::FilmAndTv => "Film en TV",
            Topic::History => "Geschiedenis",
            Topic::Music => "Muziek",
            Topic::FashionAndBeauty => "Mode en Beauty",
            Topic::Health => "Gezondheid",
            Topic::Lifestyle => "Lifestyle",
            Topic::Travel => "Reizen",
            Topic::SocietyAndBeliefs => "Maatschappij en levensbeschouwing",
        }
    }

    /// Canonical English name used in prompts.
    pub fn canonical(self) -> &'static str {
        match self {
            Topic::Nature => "Nature",
            Topic::Animals => "Animals",
            Topic::Sports => "Sports",
            Topic::Hobbies => "Hobbies",
            Topic::Politics => "Politics",
            Topic::FilmAndTv => "Film and TV",
            Topic::History => "History",
            Topic::Music => "Music",
            Topic::FashionAndBeauty => "Fashion and Beauty",
            Topic::Health => "Health",
            Topic::Lifestyle => "Lifestyle",
            Topic::Travel => "Travel",
            Topic::SocietyAndBeliefs => "Society and Beliefs",
        }
    }
}

/// Minimum number of distinct topics a selection needs.
pub const MIN_TOPICS: usize = 3;

/// Removes duplicate topics, keeping the first occurrence of each.
pub fn dedup_topics(topics: &[Topic]) -> Vec<Topic> {
    let mut seen = HashSet::new();
    topics.iter().copied().filter(|t| seen.insert(*t)).collect()
}

/// The teacher's complete choice of language, level and topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub language: Language,
    pub level: CefrLevel,
    pub topics: Vec<Topic>,
}

impl Selection {
    /// One-line summary used in the dashboard header: topics are listed
    /// when there are at most three, otherwise counted.
    pub fn headline(&self) -> String {
        let topics = if self.topics.len() > MIN_TOPICS {
            format!("{} Topics", self.topics.len())
        } else {
            self.topics
                .iter()
                .map(|t| t.label())
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("Level {} • {}", self.level, topics)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content items
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Article,
    Video,
}

/// A discovered news article or video, the source of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub title: String,
    pub source: String,
    pub date: String,
    pub url: String,
    pub summary: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Difficulty tier
// ────────────────────────────────────────────────────────────────────────────

/// Internal exercise complexity, distinct from the CEFR level of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Difficulty {
    One,
    Two,
    Three,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::One, Difficulty::Two, Difficulty::Three];

    pub fn number(self) -> u8 {
        match self {
            Difficulty::One => 1,
            Difficulty::Two => 2,
            Difficulty::Three => 3,
        }
    }

    /// Proficiency band the exercises aim at.
    pub fn band(self) -> &'static str {
        match self {
            Difficulty::One => "A2 / low B1",
            Difficulty::Two => "B1",
            Difficulty::Three => "B1+ / low B2",
        }
    }

    /// How the exercises change at this tier.
    pub fn adjustment(self) -> &'static str {
        match self {
            Difficulty::One => "Simple vocabulary, shorter sentences, more scaffolding.",
            Difficulty::Two => "Standard B1 vocabulary.",
            Difficulty::Three => "More abstract, requiring deeper inference or critical thinking.",
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Difficulty::One),
            2 => Ok(Difficulty::Two),
            3 => Ok(Difficulty::Three),
            other => Err(format!("difficulty must be 1, 2 or 3 (got {other})")),
        }
    }
}

impl From<Difficulty> for u8 {
    fn from(value: Difficulty) -> Self {
        value.number()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lesson plan
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    Open,
}

/// One exercise question. Read-only once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(rename = "questionTypeLabel")]
    pub type_label: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "correctAnswer")]
    pub model_answer: String,
}

/// The "can do" learning goal of a lesson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonGoal {
    pub skill: String,
    pub level: String,
    pub statement: String,
}

/// Generated goal plus ordered questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPlan {
    #[serde(rename = "canDo")]
    pub goal: LessonGoal,
    pub questions: Vec<Question>,
}

impl LessonPlan {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

/// Student answers keyed by question id.
pub type AnswerSet = BTreeMap<String, String>;

/// Generated feedback keyed by question id.
pub type FeedbackSet = BTreeMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offered_levels_differ_for_english() {
        assert_eq!(
            Language::English.offered_levels(),
            &[CefrLevel::A2, CefrLevel::B1, CefrLevel::B2, CefrLevel::C1]
        );
        assert!(!Language::German.offered_levels().contains(&CefrLevel::C1));
        assert!(Language::Spanish.offered_levels().contains(&CefrLevel::A1));
    }

    #[test]
    fn test_topic_uses_dutch_label_on_the_wire() {
        let json = serde_json::to_string(&Topic::SocietyAndBeliefs).unwrap();
        assert_eq!(json, "\"Maatschappij en levensbeschouwing\"");
        let back: Topic = serde_json::from_str("\"Hobby's\"").unwrap();
        assert_eq!(back, Topic::Hobbies);
        assert_eq!(back.canonical(), "Hobbies");
    }

    #[test]
    fn test_every_topic_label_matches_serde_name() {
        for topic in Topic::ALL {
            let json = serde_json::to_string(&topic).unwrap();
            assert_eq!(json, format!("\"{}\"", topic.label()));
        }
    }

    #[test]
    fn test_dedup_topics_keeps_first_occurrence() {
        let topics = dedup_topics(&[Topic::Sports, Topic::Music, Topic::Sports, Topic::Travel]);
        assert_eq!(topics, vec![Topic::Sports, Topic::Music, Topic::Travel]);
    }

    #[test]
    fn test_headline_lists_three_topics_and_counts_more() {
        let mut selection = Selection {
            language: Language::English,
            level: CefrLevel::B1,
            topics: vec![Topic::Sports, Topic::Music, Topic::Travel],
        };
        assert_eq!(selection.headline(), "Level B1 • Sport, Muziek, Reizen");
        selection.topics.push(Topic::Health);
        assert_eq!(selection.headline(), "Level B1 • 4 Topics");
    }

    #[test]
    fn test_difficulty_rejects_out_of_range() {
        assert_eq!(serde_json::from_str::<Difficulty>("2").unwrap(), Difficulty::Two);
        assert!(serde_json::from_str::<Difficulty>("0").is_err());
        assert!(serde_json::from_str::<Difficulty>("4").is_err());
        assert_eq!(serde_json::to_string(&Difficulty::Three).unwrap(), "3");
    }

    #[test]
    fn test_question_wire_format() {
        let json = r#"{
            "id": "q1",
            "type": "multiple_choice",
            "questionTypeLabel": "Multiple Choice",
            "instruction": "Choose the best answer.",
            "question": "What is the main idea?",
            "options": ["A) One", "B) Two"],
            "correctAnswer": "B) Two, because the article says so"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.kind, QuestionKind::MultipleChoice);
        assert_eq!(q.type_label, "Multiple Choice");
        assert_eq!(q.prompt, "What is the main idea?");
        assert_eq!(q.options.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn test_open_question_without_instruction_or_options() {
        let json = r#"{
            "id": "q3",
            "type": "open",
            "questionTypeLabel": "Citeer-vraag",
            "question": "Quote the sentence.",
            "correctAnswer": "The sentence is: 'x'"
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(q.kind, QuestionKind::Open);
        assert!(q.instruction.is_empty());
        assert!(q.options.is_none());
    }

    #[test]
    fn test_content_item_kind_is_lowercase_type() {
        let json = r#"{"type": "video", "title": "t", "source": "s", "date": "d", "url": "u", "summary": "x"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.kind, ContentKind::Video);
        assert!(serde_json::from_str::<ContentItem>(&json.replace("video", "podcast")).is_err());
    }
}
