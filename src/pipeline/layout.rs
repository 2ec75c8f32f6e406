//! Page layout: paragraphs → positioned text lines on Letter pages.
//!
//! Layout is done in PDF points with the origin at the bottom-left corner,
//! the same coordinate space the PDF writer uses. Text is measured with the
//! Adobe Font Metrics advance widths of the standard Times-Roman face, so
//! line breaks and justification match what a viewer draws with the builtin
//! font.

/// US Letter width in points.
pub const PAGE_WIDTH_PT: f32 = 612.0;
/// US Letter height in points.
pub const PAGE_HEIGHT_PT: f32 = 792.0;
/// One-inch margin on every side.
pub const MARGIN_PT: f32 = 72.0;
/// Width available to a line of text.
pub const FRAME_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;

/// 0.2 inch, the vertical spacer after the title and the date line.
pub const SPACER_PT: f32 = 14.4;

/// Horizontal placement of a paragraph's lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Center,
    Justify,
}

/// Fixed typographic settings for one kind of paragraph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParagraphStyle {
    pub font_size: f32,
    /// Baseline-to-baseline distance.
    pub leading: f32,
    pub alignment: Alignment,
    pub space_after: f32,
    /// Extra fixed gap inserted after the paragraph.
    pub spacer_after: f32,
}

/// Title: 18pt centered.
pub const TITLE_STYLE: ParagraphStyle = ParagraphStyle {
    font_size: 18.0,
    leading: 22.0,
    alignment: Alignment::Center,
    space_after: 12.0,
    spacer_after: SPACER_PT,
};

/// Date line: body typography followed by a spacer.
pub const DATE_STYLE: ParagraphStyle = ParagraphStyle {
    font_size: 12.0,
    leading: 16.0,
    alignment: Alignment::Justify,
    space_after: 12.0,
    spacer_after: SPACER_PT,
};

/// Body: 12pt justified.
pub const BODY_STYLE: ParagraphStyle = ParagraphStyle {
    font_size: 12.0,
    leading: 16.0,
    alignment: Alignment::Justify,
    space_after: 12.0,
    spacer_after: 0.0,
};

/// A paragraph of text with its style.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph {
    pub text: String,
    pub style: ParagraphStyle,
}

/// A piece of text drawn at a fixed position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
}

/// One output line: its baseline, size and runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub baseline: f32,
    pub font_size: f32,
    pub runs: Vec<TextRun>,
}

/// All lines drawn on one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

// ── Font metrics ─────────────────────────────────────────────────────────

/// Times-Roman advance widths (1/1000 em) for ASCII 0x20..=0x7E.
#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278, // ' '../
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444, // 0..?
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722, // @..O
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500, // P.._
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500, // `..o
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,      // p..~
];

/// Times-Roman widths for U+00A0..=U+00FF, which WinAnsi encodes at the
/// same code points.
#[rustfmt::skip]
const TIMES_ROMAN_LATIN1_WIDTHS: [u16; 96] = [
    250, 333, 500, 500, 500, 500, 200, 500, 333, 760, 276, 500, 564, 333, 760, 333, // nbsp..¯
    400, 564, 300, 300, 333, 500, 453, 250, 333, 300, 310, 500, 750, 750, 750, 444, // °..¿
    722, 722, 722, 722, 722, 722, 889, 667, 611, 611, 611, 611, 333, 333, 333, 333, // À..Ï
    722, 722, 722, 722, 722, 722, 722, 564, 722, 722, 722, 722, 722, 722, 556, 500, // Ð..ß
    444, 444, 444, 444, 444, 444, 667, 444, 444, 444, 444, 444, 278, 278, 278, 278, // à..ï
    500, 500, 500, 500, 500, 500, 500, 564, 500, 500, 500, 500, 500, 500, 500, 500, // ð..ÿ
];

/// Width used for characters WinAnsi cannot encode.
const FALLBACK_WIDTH: u16 = 500;

/// Times-Roman widths for the WinAnsi 0x80..=0x9F slots.
fn winansi_punctuation_width(c: char) -> Option<u16> {
    let w = match c {
        '€' => 500,
        '‚' => 333,
        'ƒ' => 500,
        '„' => 444,
        '…' => 1000,
        '†' | '‡' => 500,
        'ˆ' | '˜' => 333,
        '‰' => 1000,
        'Š' => 556,
        '‹' | '›' => 333,
        'Œ' => 889,
        'Ž' => 611,
        '‘' | '’' => 333,
        '“' | '”' => 444,
        '•' => 350,
        '–' => 500,
        '—' => 1000,
        '™' => 980,
        'š' => 389,
        'œ' => 722,
        'ž' => 444,
        'Ÿ' => 722,
        _ => return None,
    };
    Some(w)
}

fn char_width(c: char) -> u16 {
    match c as u32 {
        0x20..=0x7E => TIMES_ROMAN_WIDTHS[(c as u32 - 0x20) as usize],
        0xA0..=0xFF => TIMES_ROMAN_LATIN1_WIDTHS[(c as u32 - 0xA0) as usize],
        _ => winansi_punctuation_width(c).unwrap_or(FALLBACK_WIDTH),
    }
}

/// Rendered width of `text` in points at `font_size`.
pub fn text_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c) as u32).sum();
    units as f32 * font_size / 1000.0
}

// ── Line breaking ────────────────────────────────────────────────────────

/// Greedy word wrap into lines no wider than `max_width`.
///
/// A single word wider than the frame is broken between characters.
pub fn wrap_words(text: &str, font_size: f32, max_width: f32) -> Vec<Vec<String>> {
    let space = text_width(" ", font_size);
    let mut lines: Vec<Vec<String>> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_width = 0.0f32;

    for word in text.split_whitespace() {
        for piece in split_oversized(word, font_size, max_width) {
            let w = text_width(&piece, font_size);
            let needed = if current.is_empty() { w } else { current_width + space + w };
            if needed > max_width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = w;
            } else {
                current_width = needed;
            }
            current.push(piece);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn split_oversized(word: &str, font_size: f32, max_width: f32) -> Vec<String> {
    if text_width(word, font_size) <= max_width {
        return vec![word.to_string()];
    }
    let mut pieces = Vec::new();
    let mut piece = String::new();
    let mut width = 0.0f32;
    for c in word.chars() {
        let cw = char_width(c) as f32 * font_size / 1000.0;
        if width + cw > max_width && !piece.is_empty() {
            pieces.push(std::mem::take(&mut piece));
            width = 0.0;
        }
        piece.push(c);
        width += cw;
    }
    if !piece.is_empty() {
        pieces.push(piece);
    }
    pieces
}

/// Position the words of one line according to `alignment`.
///
/// Justified lines stretch the inter-word gap to fill the frame, except the
/// last line of a paragraph, which keeps natural spacing.
fn place_line(words: &[String], style: &ParagraphStyle, is_last: bool) -> Vec<TextRun> {
    let joined = words.join(" ");
    match style.alignment {
        Alignment::Center => {
            let w = text_width(&joined, style.font_size);
            vec![TextRun {
                text: joined,
                x: MARGIN_PT + ((FRAME_WIDTH_PT - w) / 2.0).max(0.0),
            }]
        }
        Alignment::Justify if is_last || words.len() < 2 => vec![TextRun {
            text: joined,
            x: MARGIN_PT,
        }],
        Alignment::Justify => {
            let words_width: f32 = words.iter().map(|w| text_width(w, style.font_size)).sum();
            let gap = (FRAME_WIDTH_PT - words_width) / (words.len() - 1) as f32;
            let mut x = MARGIN_PT;
            words
                .iter()
                .map(|w| {
                    let run = TextRun {
                        text: w.clone(),
                        x,
                    };
                    x += text_width(w, style.font_size) + gap;
                    run
                })
                .collect()
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────

/// Flow paragraphs top to bottom, starting a new page whenever the next line
/// would cross the bottom margin. Always yields at least one page.
pub fn layout_paragraphs(paragraphs: &[Paragraph]) -> Vec<PageLayout> {
    let top = PAGE_HEIGHT_PT - MARGIN_PT;
    let mut pages = vec![PageLayout::default()];
    let mut cursor = top;

    for para in paragraphs {
        let style = &para.style;
        let lines = wrap_words(&para.text, style.font_size, FRAME_WIDTH_PT);
        let count = lines.len();

        for (i, words) in lines.iter().enumerate() {
            if cursor - style.leading < MARGIN_PT && cursor < top {
                pages.push(PageLayout::default());
                cursor = top;
            }
            cursor -= style.leading;
            let runs = place_line(words, style, i + 1 == count);
            if let Some(page) = pages.last_mut() {
                page.lines.push(PlacedLine {
                    baseline: cursor,
                    font_size: style.font_size,
                    runs,
                });
            }
        }

        cursor -= style.space_after + style.spacer_after;
    }

    pages
}
