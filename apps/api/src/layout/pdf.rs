//! PDF serialization of a laid-out `Document`.
//!
//! Uses the standard Type1 Helvetica faces with WinAnsi encoding, so no font
//! program is embedded. Content streams are left uncompressed.

use bytes::Bytes;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream};
use thiserror::Error;

use crate::layout::document::{Color, Document, Element};
use crate::layout::font_metrics::{FontStyle, PageGeometry};

const PT_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to encode content stream: {0}")]
    Content(String),
    #[error("failed to write PDF: {0}")]
    Write(String),
}

/// A finished PDF ready to be sent as an attachment.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub filename: String,
    pub bytes: Bytes,
}

impl Document {
    /// Serializes every page, in order, to PDF bytes.
    pub fn to_pdf(&self) -> Result<Vec<u8>, PdfError> {
        let mut pdf = lopdf::Document::with_version("1.5");
        let pages_id = pdf.new_object_id();

        let mut fonts = Dictionary::new();
        for style in FontStyle::ALL {
            let font_id = pdf.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => style.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(style.resource_name(), font_id);
        }
        let resources_id = pdf.add_object(dictionary! { "Font" => fonts });

        let mut kids: Vec<Object> = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            let mapper = CoordinateMapper::new(self.geometry);
            let content = Content {
                operations: page_operations(&page.elements, &mapper),
            };
            let encoded = content.encode().map_err(|e| PdfError::Content(e.to_string()))?;
            let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));

            let annotations: Vec<Object> = page
                .elements
                .iter()
                .filter_map(|e| match e {
                    Element::Link {
                        x,
                        y,
                        width,
                        height,
                        url,
                    } => Some(link_annotation(&mapper, *x, *y, *width, *height, url)),
                    _ => None,
                })
                .map(|annot| Object::Reference(pdf.add_object(annot)))
                .collect();

            let mut page_dict = dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            };
            if !annotations.is_empty() {
                page_dict.set("Annots", annotations);
            }
            kids.push(pdf.add_object(page_dict).into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                (self.geometry.width_mm * PT_PER_MM).into(),
                (self.geometry.height_mm * PT_PER_MM).into(),
            ],
        };
        pdf.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = pdf.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        pdf.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        pdf.save_to(&mut out).map_err(|e| PdfError::Write(e.to_string()))?;
        Ok(out)
    }
}

/// Converts top-left millimetre coordinates into bottom-left points.
struct CoordinateMapper {
    page_height_mm: f32,
}

impl CoordinateMapper {
    fn new(geometry: PageGeometry) -> Self {
        Self {
            page_height_mm: geometry.height_mm,
        }
    }

    fn x(&self, x_mm: f32) -> f32 {
        x_mm * PT_PER_MM
    }

    fn y(&self, y_mm: f32) -> f32 {
        (self.page_height_mm - y_mm) * PT_PER_MM
    }

    fn len(&self, mm: f32) -> f32 {
        mm * PT_PER_MM
    }
}

fn page_operations(elements: &[Element], map: &CoordinateMapper) -> Vec<Operation> {
    let mut ops = Vec::new();
    for element in elements {
        match element {
            Element::Text {
                x,
                y,
                text,
                style,
                size_pt,
                color,
            } => {
                ops.push(Operation::new("BT", vec![]));
                ops.push(fill_color(*color));
                ops.push(Operation::new(
                    "Tf",
                    vec![style.resource_name().into(), (*size_pt).into()],
                ));
                ops.push(Operation::new(
                    "Td",
                    vec![map.x(*x).into(), map.y(*y).into()],
                ));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::string_literal(encode_win_ansi(text))],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
            Element::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                ops.push(Operation::new("q", vec![]));
                if let Some(color) = fill {
                    ops.push(fill_color(*color));
                }
                if let Some(color) = stroke {
                    ops.push(stroke_color(*color));
                    ops.push(Operation::new("w", vec![0.5_f32.into()]));
                }
                ops.push(Operation::new(
                    "re",
                    vec![
                        map.x(*x).into(),
                        map.y(*y + *height).into(),
                        map.len(*width).into(),
                        map.len(*height).into(),
                    ],
                ));
                let paint = match (fill.is_some(), stroke.is_some()) {
                    (true, true) => "B",
                    (true, false) => "f",
                    (false, true) => "S",
                    (false, false) => "n",
                };
                ops.push(Operation::new(paint, vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            Element::Line {
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                ops.push(Operation::new("q", vec![]));
                ops.push(stroke_color(*color));
                ops.push(Operation::new("w", vec![0.5_f32.into()]));
                ops.push(Operation::new("m", vec![map.x(*x1).into(), map.y(*y1).into()]));
                ops.push(Operation::new("l", vec![map.x(*x2).into(), map.y(*y2).into()]));
                ops.push(Operation::new("S", vec![]));
                ops.push(Operation::new("Q", vec![]));
            }
            Element::Link { .. } => {}
        }
    }
    ops
}

fn link_annotation(
    map: &CoordinateMapper,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    url: &str,
) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Link",
        "Rect" => vec![
            map.x(x).into(),
            map.y(y + height).into(),
            map.x(x + width).into(),
            map.y(y).into(),
        ],
        "Border" => vec![0.into(), 0.into(), 0.into()],
        "A" => dictionary! {
            "S" => "URI",
            "URI" => Object::string_literal(url),
        },
    }
}

fn fill_color(color: Color) -> Operation {
    Operation::new("rg", rgb_operands(color))
}

fn stroke_color(color: Color) -> Operation {
    Operation::new("RG", rgb_operands(color))
}

fn rgb_operands(Color(r, g, b): Color) -> Vec<Object> {
    [r, g, b]
        .into_iter()
        .map(|c| (c as f32 / 255.0).into())
        .collect()
}

/// Maps text onto the WinAnsi code page used by the standard fonts.
/// Characters outside it become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => c as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            'œ' => 0x9c,
            'Œ' => 0x8c,
            _ => b'?',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::document::{PageWriter, TextStyle};
    use crate::layout::font_metrics::A4;
    use crate::layout::worksheet::{render_student_document, render_teacher_document};
    use crate::lessons::fixtures;
    use crate::models::Language;

    #[test]
    fn test_pdf_has_header_and_trailer() {
        let doc = PageWriter::new(A4).finish();
        let bytes = doc.to_pdf().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        assert!(bytes.windows(5).any(|w| w == b"%%EOF"));
    }

    #[test]
    fn test_pdf_page_count_matches_document() {
        let mut writer = PageWriter::new(A4);
        writer.paragraph(
            &"lorem ipsum dolor ".repeat(1500),
            20.0,
            170.0,
            TextStyle::new(FontStyle::Regular, 11.0, 6.0),
        );
        let doc = writer.finish();
        assert!(doc.page_count() > 1);

        let parsed = lopdf::Document::load_mem(&doc.to_pdf().unwrap()).unwrap();
        assert_eq!(parsed.get_pages().len(), doc.page_count());
    }

    #[test]
    fn test_worksheet_pdf_carries_text_and_link() {
        let item = fixtures::item(1);
        let doc = render_student_document(&fixtures::lesson(), &item, Language::English);
        let bytes = doc.to_pdf().unwrap();

        let haystack = String::from_utf8_lossy(&bytes);
        assert!(haystack.contains("Source Material"));
        assert!(haystack.contains("/URI"));
        assert!(haystack.contains(&item.url));
        assert!(haystack.contains("/Helvetica-Bold"));
    }

    #[test]
    fn test_answer_key_pdf_parses() {
        let doc = render_teacher_document(&fixtures::lesson(), &fixtures::item(1), Language::English);
        let parsed = lopdf::Document::load_mem(&doc.to_pdf().unwrap()).unwrap();
        assert_eq!(parsed.get_pages().len(), doc.page_count());
    }

    #[test]
    fn test_encode_win_ansi() {
        assert_eq!(encode_win_ansi("Hobby's"), b"Hobby's".to_vec());
        assert_eq!(encode_win_ansi("Français"), vec![b'F', b'r', b'a', b'n', 0xe7, b'a', b'i', b's']);
        assert_eq!(encode_win_ansi("Level B1 • Sport"), b"Level B1 \x95 Sport".to_vec());
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }
}
