pub mod lesson;

pub use lesson::{
    dedup_topics, AnswerSet, CefrLevel, ContentItem, ContentKind, Difficulty, FeedbackSet,
    Language, LessonGoal, LessonPlan, Question, QuestionKind, Selection, Topic, MIN_TOPICS,
};
