//! Post-processing: turn recognized text into paragraph lines for layout.
//!
//! The recognizer returns the service text verbatim. Before layout the text
//! goes through a few deterministic passes so the renderer only ever sees
//! clean, printable lines:
//!
//! 1. Normalise line endings (CRLF / CR → LF)
//! 2. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens)
//! 3. Collapse runs of horizontal whitespace inside a line
//! 4. Split on line breaks, trim each line, drop the empty ones
//!
//! Every line break is a paragraph boundary. Lines are never merged back into
//! longer logical paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;

/// Split recognized text into the body paragraphs of the rendered document.
///
/// Lines that are empty after trimming are dropped entirely; there are no
/// blank-paragraph placeholders.
pub fn paragraph_lines(text: &str) -> Vec<String> {
    let s = normalise_line_endings(text);
    let s = remove_invisible_chars(&s);
    s.split('\n')
        .map(collapse_inner_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Collapse horizontal whitespace ──────────────────────────────────

static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t\u{00A0}]+").unwrap());

fn collapse_inner_whitespace(line: &str) -> String {
    RE_HORIZONTAL_WS.replace_all(line.trim(), " ").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_lines_are_dropped() {
        assert_eq!(
            paragraph_lines("Line one\n\nLine two"),
            vec!["Line one", "Line two"]
        );
    }

    #[test]
    fn whitespace_only_lines_are_dropped() {
        assert_eq!(paragraph_lines("a\n   \n\t\nb\n"), vec!["a", "b"]);
    }

    #[test]
    fn lines_are_trimmed() {
        assert_eq!(paragraph_lines("  padded  "), vec!["padded"]);
    }

    #[test]
    fn crlf_is_a_line_break() {
        assert_eq!(paragraph_lines("a\r\nb\rc"), vec!["a", "b", "c"]);
    }

    #[test]
    fn invisible_chars_removed() {
        assert_eq!(
            paragraph_lines("hello\u{200B}world\u{FEFF}"),
            vec!["helloworld"]
        );
    }

    #[test]
    fn inner_whitespace_collapsed() {
        assert_eq!(paragraph_lines("buy   milk\t\tand eggs"), vec!["buy milk and eggs"]);
    }

    #[test]
    fn empty_text_has_no_paragraphs() {
        assert!(paragraph_lines("").is_empty());
        assert!(paragraph_lines("\n\n").is_empty());
    }

    #[test]
    fn consecutive_lines_stay_separate() {
        let lines = paragraph_lines("first half of a sentence\nsecond half");
        assert_eq!(lines.len(), 2);
    }
}
