//! Student worksheet and teacher answer key.
//!
//! Both renderers are pure: the same lesson, item and language always yield
//! the same `Document`. The student worksheet never draws a model answer.

use crate::layout::document::{Color, Document, Element, PageWriter, TextStyle};
use crate::layout::font_metrics::{get_metrics, FontStyle, A4};
use crate::layout::wrap::wrap_text;
use crate::models::{ContentItem, Language, LessonPlan, QuestionKind};

const TITLE: TextStyle = TextStyle::new(FontStyle::Bold, 18.0, 8.0);
const SUBTITLE: TextStyle = TextStyle::new(FontStyle::Regular, 10.0, 5.0).color(Color::grey(100));
const SECTION: TextStyle = TextStyle::new(FontStyle::Bold, 12.0, 6.0);
const HEADING: TextStyle = TextStyle::new(FontStyle::Bold, 14.0, 10.0);
const BODY: TextStyle = TextStyle::new(FontStyle::Regular, 11.0, 6.0);
const LINK: TextStyle = TextStyle::new(FontStyle::Regular, 9.0, 5.0).color(Color(0, 0, 255));
const GOAL: TextStyle = TextStyle::new(FontStyle::Oblique, 10.0, 5.0);
const QUESTION_LABEL: TextStyle = TextStyle::new(FontStyle::Bold, 11.0, 6.0);
const INSTRUCTION: TextStyle = TextStyle::new(FontStyle::Oblique, 10.0, 5.0).color(Color::grey(80));
const KEY_QUESTION: TextStyle = TextStyle::new(FontStyle::Bold, 11.0, 5.0);
const KEY_LABEL: TextStyle = TextStyle::new(FontStyle::Bold, 11.0, 5.0).color(Color(0, 100, 0));
const KEY_ANSWER: TextStyle = TextStyle::new(FontStyle::Regular, 11.0, 5.0);

const CHECKBOX_MM: f32 = 4.0;
const OPTION_INDENT_MM: f32 = 8.0;
const RULED_LINES: usize = 3;
const RULED_SPACING_MM: f32 = 8.0;
const RULE_COLOR: Color = Color::grey(200);
const QUESTION_GAP_MM: f32 = 10.0;
const ANSWER_BOX_FILL: Color = Color(240, 248, 255);
const ANSWER_BOX_PADDING_MM: f32 = 2.0;
const ANSWER_LABEL_MM: f32 = 6.0;
const ANSWER_FIRST_LINE_MM: f32 = 11.0;
const ANSWER_BOX_BOTTOM_MM: f32 = 4.0;
const ANSWER_BOX_MIN_MM: f32 = 15.0;

pub fn worksheet_filename(language: Language, date: &str) -> String {
    format!("{}_Worksheet_{}.pdf", language.name(), date)
}

pub fn answer_key_filename(language: Language, date: &str) -> String {
    format!("{}_AnswerKey_{}.pdf", language.name(), date)
}

/// Source material plus the questions to answer. Contains no model answers.
pub fn render_student_document(
    lesson: &LessonPlan,
    item: &ContentItem,
    language: Language,
) -> Document {
    let mut w = PageWriter::new(A4);
    let x = A4.margin_mm;
    let width = A4.content_width();

    header(
        &mut w,
        &item.title,
        &format!(
            "{} Lesson | Source: {} | Date: {}",
            language.name(),
            item.source,
            item.date
        ),
    );

    // Source material
    w.ensure_space(SECTION.line_height + BODY.line_height);
    w.text_at("Source Material", x, w.y(), SECTION);
    w.advance(SECTION.line_height);
    w.paragraph(&item.summary, x, width, BODY);

    w.ensure_space(LINK.line_height);
    w.link("Read full original article/video", &item.url, x, LINK);
    w.advance(15.0);

    // Exercises
    w.ensure_space(HEADING.line_height + GOAL.line_height);
    w.text_at("Exercises", x, w.y(), HEADING);
    w.advance(HEADING.line_height);
    w.paragraph(
        &format!("Goal: {} ({})", lesson.goal.statement, lesson.goal.level),
        x,
        width,
        GOAL,
    );
    w.advance(5.0);

    for (n, q) in lesson.questions.iter().enumerate() {
        // Keep the label with the first line of the question.
        w.ensure_space(QUESTION_LABEL.line_height + BODY.line_height);
        w.text_at(
            &format!("Question {} ({})", n + 1, q.type_label),
            x,
            w.y(),
            QUESTION_LABEL,
        );
        w.advance(QUESTION_LABEL.line_height);

        if !q.instruction.trim().is_empty() {
            w.paragraph(&q.instruction, x, width, INSTRUCTION);
        }

        w.paragraph(&q.prompt, x, width, BODY);
        w.advance(2.0);

        match q.kind {
            QuestionKind::MultipleChoice => {
                for option in q.options.iter().flatten() {
                    checkbox_option(&mut w, option, x, width);
                }
            }
            QuestionKind::Open => ruled_workspace(&mut w, x, width),
        }

        w.advance(QUESTION_GAP_MM);
    }

    w.finish()
}

/// Every question with its model answer in a shaded box.
pub fn render_teacher_document(
    lesson: &LessonPlan,
    item: &ContentItem,
    language: Language,
) -> Document {
    let mut w = PageWriter::new(A4);
    let x = A4.margin_mm;
    let width = A4.content_width();

    header(
        &mut w,
        &format!("ANSWER KEY: {}", item.title),
        &format!("{} Teacher Model | {}", language.name(), item.source),
    );

    for (n, q) in lesson.questions.iter().enumerate() {
        w.paragraph(&format!("Q{}: {}", n + 1, q.prompt), x, width, KEY_QUESTION);
        w.advance(4.0);
        answer_box(&mut w, &q.model_answer, x, width);
        w.advance(QUESTION_GAP_MM);
    }

    w.finish()
}

fn header(w: &mut PageWriter, title: &str, subtitle: &str) {
    let x = w.geometry().margin_mm;
    let width = w.geometry().content_width();
    w.paragraph(title, x, width, TITLE);
    w.paragraph(subtitle, x, width, SUBTITLE);
    w.advance(5.0);
}

/// A checkbox followed by the wrapped option text. Kept on one page when it
/// fits on one; otherwise the text continues line by line.
fn checkbox_option(w: &mut PageWriter, option: &str, x: f32, width: f32) {
    let text_x = x + OPTION_INDENT_MM;
    let lines = wrap_text(
        option,
        get_metrics(BODY.style),
        BODY.size_pt,
        width - OPTION_INDENT_MM - 2.0,
    );
    if lines.is_empty() {
        return;
    }
    let height = lines.len() as f32 * BODY.line_height;
    if height <= w.usable_height() {
        w.ensure_space(height);
    }

    for (i, line) in lines.iter().enumerate() {
        w.ensure_space(BODY.line_height);
        if i == 0 {
            w.push(Element::Rect {
                x,
                y: w.y() - CHECKBOX_MM,
                width: CHECKBOX_MM,
                height: CHECKBOX_MM,
                fill: None,
                stroke: Some(Color::BLACK),
            });
        }
        w.text_at(line, text_x, w.y(), BODY);
        w.advance(BODY.line_height);
    }
}

/// Three ruled lines for a written answer, kept on one page.
fn ruled_workspace(w: &mut PageWriter, x: f32, width: f32) {
    w.ensure_space(2.0 + RULED_SPACING_MM * RULED_LINES as f32);
    w.advance(2.0);
    for i in 0..RULED_LINES {
        if i > 0 {
            w.advance(RULED_SPACING_MM);
        }
        let y = w.y();
        w.push(Element::Line {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y,
            color: RULE_COLOR,
        });
    }
}

/// Shaded box labelled "Correct Answer:" and sized to the wrapped answer.
/// An answer taller than a page is split into one shaded box per page.
fn answer_box(w: &mut PageWriter, answer: &str, x: f32, width: f32) {
    let lines = wrap_text(
        answer,
        get_metrics(KEY_ANSWER.style),
        KEY_ANSWER.size_pt,
        width - 2.0 * ANSWER_BOX_PADDING_MM - 1.0,
    );
    let height = (ANSWER_FIRST_LINE_MM
        + lines.len().saturating_sub(1) as f32 * KEY_ANSWER.line_height
        + ANSWER_BOX_BOTTOM_MM)
        .max(ANSWER_BOX_MIN_MM);
    if height <= w.usable_height() {
        w.ensure_space(height);
    } else {
        // Keep the label with the first answer line.
        w.ensure_space(ANSWER_FIRST_LINE_MM + ANSWER_BOX_BOTTOM_MM);
    }

    let inner_x = x + ANSWER_BOX_PADDING_MM;
    let top = w.y();
    let mut segment = BoxSegment {
        top,
        texts: vec![("Correct Answer:", top + ANSWER_LABEL_MM, KEY_LABEL)],
    };
    let mut split = false;
    w.advance(ANSWER_FIRST_LINE_MM);

    for line in &lines {
        if !w.fits(ANSWER_BOX_BOTTOM_MM) {
            let segment_height = w.y() - KEY_ANSWER.line_height + ANSWER_BOX_BOTTOM_MM - segment.top;
            segment.close(w, inner_x, x, width, segment_height);
            w.break_page();
            split = true;
            segment = BoxSegment {
                top: w.y(),
                texts: Vec::new(),
            };
            w.advance(ANSWER_FIRST_LINE_MM - ANSWER_LABEL_MM);
        }
        segment.texts.push((line.as_str(), w.y(), KEY_ANSWER));
        w.advance(KEY_ANSWER.line_height);
    }

    if split {
        let segment_top = segment.top;
        let segment_height = w.y() - KEY_ANSWER.line_height + ANSWER_BOX_BOTTOM_MM - segment_top;
        segment.close(w, inner_x, x, width, segment_height);
        w.advance(segment_top + segment_height - w.y());
    } else {
        segment.close(w, inner_x, x, width, height);
        w.advance(top + height - w.y());
    }
}

/// The part of an answer box that lands on one page. Text is buffered so the
/// shading is drawn underneath it.
struct BoxSegment<'a> {
    top: f32,
    texts: Vec<(&'a str, f32, TextStyle)>,
}

impl BoxSegment<'_> {
    fn close(self, w: &mut PageWriter, text_x: f32, x: f32, width: f32, height: f32) {
        w.push(Element::Rect {
            x,
            y: self.top,
            width,
            height,
            fill: Some(ANSWER_BOX_FILL),
            stroke: None,
        });
        for (text, y, style) in self.texts {
            w.text_at(text, text_x, y, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lessons::fixtures;

    fn normalized(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_student_document_has_no_model_answers() {
        let lesson = fixtures::lesson();
        let doc = render_student_document(&lesson, &fixtures::item(1), Language::English);
        let text = normalized(&doc.plain_text());

        for q in &lesson.questions {
            assert!(
                !text.contains(&normalized(&q.model_answer)),
                "student worksheet leaked the answer to {}",
                q.id
            );
            assert!(text.contains(&normalized(&q.prompt)));
        }
        assert!(!text.contains("Correct Answer"));
    }

    #[test]
    fn test_teacher_document_has_every_model_answer() {
        let lesson = fixtures::lesson();
        let doc = render_teacher_document(&lesson, &fixtures::item(1), Language::English);
        let text = normalized(&doc.plain_text());

        for q in &lesson.questions {
            assert!(text.contains(&normalized(&q.model_answer)), "missing {}", q.id);
        }
        assert!(text.starts_with("ANSWER KEY: Local football club wins regional cup 1"));
        assert!(text.contains("English Teacher Model | BBC News"));
        assert!(text.contains("Q3: Quote the sentence"));
    }

    #[test]
    fn test_student_document_is_deterministic() {
        let lesson = fixtures::lesson();
        let item = fixtures::item(2);
        assert_eq!(
            render_student_document(&lesson, &item, Language::German),
            render_student_document(&lesson, &item, Language::German)
        );
    }

    #[test]
    fn test_student_document_structure() {
        let lesson = fixtures::lesson();
        let item = fixtures::item(1);
        let doc = render_student_document(&lesson, &item, Language::French);
        let text = doc.plain_text();

        assert!(text.contains("French Lesson | Source: BBC News | Date: 2025-03-14"));
        assert!(text.contains("Source Material"));
        assert!(text.contains("Read full original article/video"));
        assert!(text.contains("Exercises"));
        assert!(text.contains("Goal: I can understand"));
        assert!(text.contains("Question 1 (Multiple Choice)"));
        assert!(text.contains("Question 3 (Citeer-vraag)"));
        assert_eq!(doc.links().collect::<Vec<_>>(), vec![item.url.as_str()]);

        let elements: Vec<&Element> = doc.pages.iter().flat_map(|p| &p.elements).collect();
        let checkboxes = elements
            .iter()
            .filter(|e| matches!(e, Element::Rect { fill: None, .. }))
            .count();
        let rules = elements
            .iter()
            .filter(|e| matches!(e, Element::Line { .. }))
            .count();
        // 2 multiple-choice questions with 4 options, 3 open questions with 3 rules.
        assert_eq!(checkboxes, 8);
        assert_eq!(rules, 9);
    }

    #[test]
    fn test_teacher_document_has_no_workspace() {
        let doc = render_teacher_document(&fixtures::lesson(), &fixtures::item(1), Language::English);
        let elements: Vec<&Element> = doc.pages.iter().flat_map(|p| &p.elements).collect();
        assert!(!elements.iter().any(|e| matches!(e, Element::Line { .. })));
        assert!(!elements.iter().any(|e| matches!(e, Element::Rect { fill: None, .. })));
        let boxes = elements
            .iter()
            .filter(|e| matches!(e, Element::Rect { fill: Some(_), .. }))
            .count();
        assert_eq!(boxes, 5);
    }

    #[test]
    fn test_long_lesson_paginates_within_margins() {
        let mut lesson = fixtures::lesson();
        for q in &mut lesson.questions {
            q.prompt = "Explain what the article says about this. ".repeat(30);
            q.model_answer = "A detailed model answer sentence. ".repeat(40);
        }
        let item = fixtures::item(1);

        for doc in [
            render_student_document(&lesson, &item, Language::English),
            render_teacher_document(&lesson, &item, Language::English),
        ] {
            assert!(doc.page_count() > 1);
            for page in &doc.pages {
                for e in &page.elements {
                    match e {
                        Element::Text { y, .. } => assert!(*y <= A4.bottom_limit() + 0.01),
                        Element::Rect { y, height, .. } => {
                            assert!(*y + *height <= A4.bottom_limit() + 0.01)
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn assert_within_margins(doc: &Document) {
        for (n, page) in doc.pages.iter().enumerate() {
            for e in &page.elements {
                match e {
                    Element::Text { y, .. } => {
                        assert!(*y <= A4.bottom_limit() + 0.01, "text at {y} on page {n}")
                    }
                    Element::Rect { y, height, .. } => {
                        assert!(*y >= A4.margin_mm - CHECKBOX_MM - 0.01);
                        assert!(
                            *y + *height <= A4.bottom_limit() + 0.01,
                            "box ends at {} on page {n}",
                            y + height
                        )
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_answer_taller_than_a_page_continues_on_next_page() {
        let mut lesson = fixtures::lesson();
        lesson.questions.truncate(1);
        let answer = format!("{} ", lesson.questions[0].model_answer).repeat(200);
        lesson.questions[0].model_answer = answer.clone();

        let doc = render_teacher_document(&lesson, &fixtures::item(1), Language::English);
        assert!(doc.page_count() > 2);
        assert_within_margins(&doc);
        assert!(normalized(&doc.plain_text()).contains(&normalized(&answer)));

        // One shaded box per page, drawn before the text it sits under.
        for page in &doc.pages[1..] {
            assert!(matches!(
                page.elements.first(),
                Some(Element::Rect { fill: Some(_), .. })
            ));
        }
        let boxes = doc
            .pages
            .iter()
            .flat_map(|p| &p.elements)
            .filter(|e| matches!(e, Element::Rect { fill: Some(_), .. }))
            .count();
        assert_eq!(boxes, doc.page_count());
    }

    #[test]
    fn test_option_taller_than_a_page_continues_on_next_page() {
        let mut lesson = fixtures::lesson();
        let option = "option text ".repeat(1000);
        if let Some(options) = lesson.questions[0].options.as_mut() {
            options[0] = option.clone();
        }

        let doc = render_student_document(&lesson, &fixtures::item(1), Language::English);
        assert!(doc.page_count() > 2);
        assert_within_margins(&doc);
        assert!(normalized(&doc.plain_text()).contains(&normalized(&option)));

        let checkboxes = doc
            .pages
            .iter()
            .flat_map(|p| &p.elements)
            .filter(|e| matches!(e, Element::Rect { fill: None, .. }))
            .count();
        assert_eq!(checkboxes, 8);
    }

    #[test]
    fn test_answer_box_grows_with_answer() {
        let mut lesson = fixtures::lesson();
        lesson.questions.truncate(1);
        let item = fixtures::item(1);
        let short = render_teacher_document(&lesson, &item, Language::English);
        lesson.questions[0].model_answer = "A much longer answer. ".repeat(20);
        let long = render_teacher_document(&lesson, &item, Language::English);

        let box_height = |doc: &Document| {
            doc.pages[0]
                .elements
                .iter()
                .find_map(|e| match e {
                    Element::Rect {
                        fill: Some(_),
                        height,
                        ..
                    } => Some(*height),
                    _ => None,
                })
                .unwrap()
        };
        assert_eq!(box_height(&short), 15.0);
        assert!(box_height(&long) > 15.0);
    }

    #[test]
    fn test_filenames_use_language_and_date_verbatim() {
        assert_eq!(
            worksheet_filename(Language::Spanish, "14 maart 2025"),
            "Spanish_Worksheet_14 maart 2025.pdf"
        );
        assert_eq!(
            answer_key_filename(Language::English, "2025-03-14"),
            "English_AnswerKey_2025-03-14.pdf"
        );
    }
}
