//! Page-oriented document model and the cursor that fills it.
//!
//! Coordinates are millimetres from the top-left corner of the page. Text
//! positions are baselines. Nothing here knows about PDF; see `pdf.rs`.

use serde::Serialize;

use crate::layout::font_metrics::{get_metrics, FontStyle, PageGeometry, MM_PER_PT};
use crate::layout::wrap::wrap_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const fn grey(level: u8) -> Color {
        Color(level, level, level)
    }
}

/// One drawing command on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    Text {
        x: f32,
        y: f32,
        text: String,
        style: FontStyle,
        size_pt: f32,
        color: Color,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<Color>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Color,
    },
    /// Clickable area opening `url`; drawn nothing by itself.
    Link {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        url: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Page {
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

#[cfg(test)]
impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All text runs in drawing order, joined with single spaces.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| match e {
                Element::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn links(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| match e {
                Element::Link { url, .. } => Some(url.as_str()),
                _ => None,
            })
    }
}

/// Text appearance for a run of lines.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub style: FontStyle,
    pub size_pt: f32,
    pub color: Color,
    /// Baseline-to-baseline distance in mm.
    pub line_height: f32,
}

impl TextStyle {
    pub const fn new(style: FontStyle, size_pt: f32, line_height: f32) -> Self {
        Self {
            style,
            size_pt,
            color: Color::BLACK,
            line_height,
        }
    }

    pub const fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Cursor over a growing document. Starts a new page whenever the next line
/// or reserved block would cross the bottom margin.
pub struct PageWriter {
    geometry: PageGeometry,
    pages: Vec<Page>,
    y: f32,
}

impl PageWriter {
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            pages: vec![Page::default()],
            y: geometry.margin_mm,
        }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn advance(&mut self, dy: f32) {
        self.y += dy;
    }

    /// Height available between the top and bottom margins of a fresh page.
    pub fn usable_height(&self) -> f32 {
        self.geometry.bottom_limit() - self.geometry.margin_mm
    }

    /// Whether `height` mm still fit above the bottom margin.
    pub fn fits(&self, height: f32) -> bool {
        self.y + height <= self.geometry.bottom_limit()
    }

    /// Breaks the page unless `height` mm still fit above the bottom margin.
    /// Returns true when a new page was started.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        let at_top = (self.y - self.geometry.margin_mm).abs() < f32::EPSILON;
        if !self.fits(height) && !at_top {
            self.break_page();
            true
        } else {
            false
        }
    }

    /// Starts a new page and moves the cursor to its top margin.
    pub fn break_page(&mut self) {
        self.pages.push(Page::default());
        self.y = self.geometry.margin_mm;
    }

    pub fn push(&mut self, element: Element) {
        if let Some(page) = self.pages.last_mut() {
            page.elements.push(element);
        }
    }

    /// Wraps `text` to `width` and writes it line by line at `x`, advancing
    /// the cursor by one line height per line. Returns the number of lines.
    pub fn paragraph(&mut self, text: &str, x: f32, width: f32, style: TextStyle) -> usize {
        let lines = wrap_text(text, get_metrics(style.style), style.size_pt, width);
        for line in &lines {
            self.ensure_space(style.line_height);
            self.text_at(line, x, self.y, style);
            self.y += style.line_height;
        }
        lines.len()
    }

    /// Places one run at an absolute position without moving the cursor.
    pub fn text_at(&mut self, text: &str, x: f32, y: f32, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.push(Element::Text {
            x,
            y,
            text: text.to_string(),
            style: style.style,
            size_pt: style.size_pt,
            color: style.color,
        });
    }

    /// Writes a single-line run at the cursor with a clickable area over it.
    pub fn link(&mut self, text: &str, url: &str, x: f32, style: TextStyle) {
        let width = get_metrics(style.style).measure_mm(text, style.size_pt);
        let height = style.size_pt * MM_PER_PT;
        self.text_at(text, x, self.y, style);
        self.push(Element::Link {
            x,
            y: self.y - height,
            width,
            height: height * 1.25,
            url: url.to_string(),
        });
    }

    pub fn finish(self) -> Document {
        Document {
            geometry: self.geometry,
            pages: self.pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::A4;

    const BODY: TextStyle = TextStyle::new(FontStyle::Regular, 11.0, 6.0);

    #[test]
    fn test_new_writer_has_one_empty_page() {
        let doc = PageWriter::new(A4).finish();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.plain_text().is_empty());
    }

    #[test]
    fn test_ensure_space_breaks_near_bottom() {
        let mut writer = PageWriter::new(A4);
        writer.advance(250.0);
        assert!(!writer.ensure_space(5.0));
        assert!(writer.ensure_space(10.0));
        assert_eq!(writer.y(), A4.margin_mm);
        assert_eq!(writer.finish().page_count(), 2);
    }

    #[test]
    fn test_ensure_space_never_breaks_an_empty_page() {
        let mut writer = PageWriter::new(A4);
        assert!(!writer.ensure_space(400.0));
        assert_eq!(writer.finish().page_count(), 1);
    }

    #[test]
    fn test_break_page_resets_cursor() {
        let mut writer = PageWriter::new(A4);
        assert_eq!(writer.usable_height(), 257.0);
        assert!(writer.fits(257.0));
        assert!(!writer.fits(258.0));
        writer.advance(100.0);
        writer.break_page();
        assert_eq!(writer.y(), A4.margin_mm);
        assert_eq!(writer.finish().page_count(), 2);
    }

    #[test]
    fn test_paragraph_flows_across_pages() {
        let mut writer = PageWriter::new(A4);
        let text = "word ".repeat(2000);
        let lines = writer.paragraph(&text, 20.0, 170.0, BODY);
        let doc = writer.finish();

        assert!(doc.page_count() > 1);
        let drawn = doc
            .pages
            .iter()
            .flat_map(|p| &p.elements)
            .filter(|e| matches!(e, Element::Text { .. }))
            .count();
        assert_eq!(drawn, lines);
        for page in &doc.pages {
            for e in &page.elements {
                if let Element::Text { y, .. } = e {
                    assert!(*y <= A4.bottom_limit());
                }
            }
        }
    }

    #[test]
    fn test_link_records_url() {
        let mut writer = PageWriter::new(A4);
        writer.link("Read more", "https://example.org/a", 20.0, BODY);
        let doc = writer.finish();
        assert_eq!(doc.links().collect::<Vec<_>>(), vec!["https://example.org/a"]);
        assert_eq!(doc.plain_text(), "Read more");
    }
}
