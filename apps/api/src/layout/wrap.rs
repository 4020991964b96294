//! Greedy word wrap against the static metric tables.

use crate::layout::font_metrics::FontMetricTable;

/// Splits `text` into lines no wider than `max_width_mm` at `size_pt`.
///
/// Breaks at whitespace; explicit newlines start a new line and blank lines
/// are kept. A word wider than a full line is broken at character level.
/// Empty or all-whitespace text yields no lines.
pub fn wrap_text(
    text: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width_mm: f32,
) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.trim_end().split('\n') {
        wrap_paragraph(paragraph, metrics, size_pt, max_width_mm, &mut lines);
    }
    lines
}

fn wrap_paragraph(
    paragraph: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width: f32,
    lines: &mut Vec<String>,
) {
    let space_w = metrics.space_mm(size_pt);
    let mut current = String::new();
    let mut current_width = 0.0_f32;

    for word in paragraph.split_whitespace() {
        let word_w = metrics.measure_mm(word, size_pt);

        if word_w > max_width {
            // Flush what we have, then hard-break the word itself.
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let (pieces, rest) = break_word(word, metrics, size_pt, max_width);
            lines.extend(pieces);
            current_width = metrics.measure_mm(&rest, size_pt);
            current = rest;
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_width = word_w;
        } else if current_width + space_w + word_w > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_width = word_w;
        } else {
            current.push(' ');
            current.push_str(word);
            current_width += space_w + word_w;
        }
    }

    // An empty paragraph still occupies a line.
    lines.push(current);
}

/// Cuts an over-long word into full-width pieces plus a trailing remainder.
fn break_word(
    word: &str,
    metrics: &FontMetricTable,
    size_pt: f32,
    max_width: f32,
) -> (Vec<String>, String) {
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0_f32;

    for c in word.chars() {
        let mut buf = [0u8; 4];
        let char_w = metrics.measure_mm(c.encode_utf8(&mut buf), size_pt);
        if !piece.is_empty() && width + char_w > max_width {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += char_w;
    }
    (pieces, piece)
}
