//! Document rendering: recognized text → paginated Letter PDF.
//!
//! The document always has the same shape: a centered title, a
//! "Generated on" line with the local date at render time, then one justified
//! paragraph per non-empty line of text. Everything is set in the builtin
//! Times-Roman face, so no font files are embedded.
//!
//! printpdf 0.8 builds a document from `PdfPage` values holding `Op` lists;
//! every positioned text run becomes its own text section.

use crate::error::Notes2PdfError;
use crate::pipeline::layout::{
    layout_paragraphs, PageLayout, Paragraph, BODY_STYLE, DATE_STYLE, PAGE_HEIGHT_PT,
    PAGE_WIDTH_PT, TITLE_STYLE,
};
use crate::pipeline::postprocess::paragraph_lines;
use chrono::NaiveDate;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use std::path::Path;
use tracing::{debug, info};

/// Fixed document title.
pub const DOCUMENT_TITLE: &str = "Handwritten Notes to Digital Text";

const FONT: BuiltinFont = BuiltinFont::TimesRoman;

/// The ordered paragraphs of a rendered note.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContent {
    pub paragraphs: Vec<Paragraph>,
}

impl DocumentContent {
    /// The paragraphs that came from the recognized text. Empty when the
    /// content has no body (or was built without a title and date line).
    pub fn body(&self) -> &[Paragraph] {
        self.paragraphs.get(2..).unwrap_or(&[])
    }
}

/// Summary of a written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSummary {
    pub body_paragraphs: usize,
    pub page_count: usize,
}

/// `Generated on: <Month> <DD>, <YYYY>`.
pub fn date_line(date: NaiveDate) -> String {
    format!("Generated on: {}", date.format("%B %d, %Y"))
}

/// Assemble title, date line and body paragraphs for `text`.
pub fn build_content(text: &str, date: NaiveDate) -> DocumentContent {
    let mut paragraphs = vec![
        Paragraph {
            text: DOCUMENT_TITLE.to_string(),
            style: TITLE_STYLE,
        },
        Paragraph {
            text: date_line(date),
            style: DATE_STYLE,
        },
    ];
    paragraphs.extend(paragraph_lines(text).into_iter().map(|line| Paragraph {
        text: line,
        style: BODY_STYLE,
    }));
    DocumentContent { paragraphs }
}

/// Break the content into positioned lines on Letter pages.
pub fn layout_document(content: &DocumentContent) -> Vec<PageLayout> {
    layout_paragraphs(&content.paragraphs)
}

/// Lay out the content and serialise it to PDF bytes.
///
/// Returns the bytes and the page count.
pub fn render_pdf(content: &DocumentContent) -> (Vec<u8>, usize) {
    let pages = layout_document(content);
    let page_count = pages.len();

    let mut doc = PdfDocument::new(DOCUMENT_TITLE);
    let pdf_pages: Vec<PdfPage> = pages.iter().map(page_ops).collect();
    doc.with_pages(pdf_pages);

    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let bytes = doc.save(&PdfSaveOptions::default(), &mut warnings);
    debug!(
        "Serialised {} pages ({} bytes, {} warnings)",
        page_count,
        bytes.len(),
        warnings.len()
    );
    (bytes, page_count)
}

/// Render `text` to a PDF at `output_path`, dated today (local time).
///
/// An existing file at `output_path` is overwritten.
pub fn render(text: &str, output_path: &Path) -> Result<RenderSummary, Notes2PdfError> {
    let today = chrono::Local::now().date_naive();
    render_dated(text, today, output_path)
}

/// [`render`] with an explicit date.
pub fn render_dated(
    text: &str,
    date: NaiveDate,
    output_path: &Path,
) -> Result<RenderSummary, Notes2PdfError> {
    let content = build_content(text, date);
    let body_paragraphs = content.body().len();
    let (bytes, page_count) = render_pdf(&content);

    let write_failed = |source: std::io::Error| Notes2PdfError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source,
    };
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_failed)?;
    }
    std::fs::write(output_path, &bytes).map_err(write_failed)?;

    info!(
        "PDF written to {} ({} paragraphs, {} pages)",
        output_path.display(),
        body_paragraphs,
        page_count
    );
    Ok(RenderSummary {
        body_paragraphs,
        page_count,
    })
}

fn page_ops(layout: &PageLayout) -> PdfPage {
    let mut ops: Vec<Op> = Vec::new();
    for line in &layout.lines {
        for run in &line.runs {
            ops.push(Op::StartTextSection);
            ops.push(Op::SetTextCursor {
                pos: Point {
                    x: Pt(run.x),
                    y: Pt(line.baseline),
                },
            });
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(line.font_size),
                font: FONT,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(run.text.clone())],
                font: FONT,
            });
            ops.push(Op::EndTextSection);
        }
    }
    PdfPage::new(pt_to_mm(PAGE_WIDTH_PT), pt_to_mm(PAGE_HEIGHT_PT), ops)
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}
