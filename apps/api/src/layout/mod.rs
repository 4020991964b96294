// Document Layout Engine
// Implements: static font metrics, greedy wrapping, line-level pagination,
// student worksheet / teacher answer key, PDF serialization.
// Rendering is pure and CPU-bound; handlers run it inside spawn_blocking.

pub mod document;
pub mod font_metrics;
pub mod pdf;
pub mod worksheet;
pub mod wrap;

pub use pdf::RenderedPdf;
pub use worksheet::{
    answer_key_filename, render_student_document, render_teacher_document, worksheet_filename,
};
