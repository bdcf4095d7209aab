//! # Text Measurement
//!
//! Character widths for the standard Helvetica faces and greedy wrapping at
//! UAX#14 break opportunities. Enough to give the layout engine real natural
//! heights for text without embedding fonts.

use unicode_linebreak::{linebreaks, BreakOpportunity};

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.2;

/// Fraction of the font size above the baseline.
pub const ASCENT: f64 = 0.718;

/// Helvetica advance widths (1/1000 em) for U+0020..=U+007E.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :;<=>?@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 333, // [\]^_`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // {|}~
];

/// Helvetica-Bold advance widths (1/1000 em) for U+0020..=U+007E.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :;<=>?@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    333, 278, 333, 584, 556, 333, // [\]^_`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, // a-m
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // n-z
    389, 280, 389, 584, // {|}~
];

/// Width used for anything outside printable ASCII.
const FALLBACK_WIDTH: u16 = 556;

/// Advance width of `ch` in points.
pub fn char_width(ch: char, font_size: f64, bold: bool) -> f64 {
    let table = if bold {
        &HELVETICA_BOLD_WIDTHS
    } else {
        &HELVETICA_WIDTHS
    };
    let units = (ch as u32)
        .checked_sub(0x20)
        .and_then(|i| table.get(i as usize))
        .copied()
        .unwrap_or(FALLBACK_WIDTH);
    units as f64 / 1000.0 * font_size
}

pub fn measure_width(text: &str, font_size: f64, bold: bool) -> f64 {
    text.chars().map(|ch| char_width(ch, font_size, bold)).sum()
}

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenLine {
    pub text: String,
    pub width: f64,
}

/// Slack allowed when comparing a line against its box. Widths summed in a
/// different order must still fit the width they were measured at.
const WIDTH_TOLERANCE: f64 = 1e-6;

/// UAX#14 break opportunity before each char, by char index.
fn break_opportunities(text: &str, char_count: usize) -> Vec<Option<BreakOpportunity>> {
    let mut result = vec![None; char_count];

    // linebreaks() yields the byte offset where the next segment starts.
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }
    result
}

fn is_newline(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn finish_line(chars: &[char], font_size: f64, bold: bool) -> BrokenLine {
    let text: String = chars.iter().filter(|ch| !is_newline(**ch)).collect();
    let text = text.trim_end().to_string();
    let width = measure_width(&text, font_size, bold);
    BrokenLine { text, width }
}

/// Break `text` into lines no wider than `max_width`.
///
/// Lines end at UAX#14 break opportunities, so text without spaces (CJK)
/// wraps too. Mandatory breaks (newlines) always break. A run with no break
/// opportunity that is wider than the line is kept whole on a line of its own.
pub fn break_lines(text: &str, font_size: f64, bold: bool, max_width: f64) -> Vec<BrokenLine> {
    if text.is_empty() {
        return vec![BrokenLine {
            text: String::new(),
            width: 0.0,
        }];
    }

    let chars: Vec<char> = text.chars().collect();
    let widths: Vec<f64> = chars
        .iter()
        .map(|&ch| char_width(ch, font_size, bold))
        .collect();
    let opportunities = break_opportunities(text, chars.len());
    let limit = max_width + WIDTH_TOLERANCE;

    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut line_width: f64 = 0.0;
    let mut last_break: Option<usize> = None;

    for (i, &ch) in chars.iter().enumerate() {
        if i > 0 {
            match opportunities[i] {
                Some(BreakOpportunity::Mandatory) => {
                    lines.push(finish_line(&chars[line_start..i], font_size, bold));
                    line_start = i;
                    line_width = 0.0;
                    last_break = None;
                }
                Some(BreakOpportunity::Allowed) => last_break = Some(i),
                None => {}
            }
        }

        if is_newline(ch) {
            continue;
        }

        // Trailing spaces hang past the edge.
        if !ch.is_whitespace() && line_width + widths[i] > limit && line_start < i {
            if let Some(at) = last_break.filter(|&at| at > line_start) {
                lines.push(finish_line(&chars[line_start..at], font_size, bold));
                line_start = at;
                line_width = widths[at..i].iter().sum::<f64>();
                last_break = None;
            }
        }
        line_width += widths[i];
    }

    lines.push(finish_line(&chars[line_start..], font_size, bold));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_widths_come_from_the_tables() {
        assert!((char_width('W', 10.0, false) - 9.44).abs() < 1e-9);
        assert!((char_width('i', 10.0, false) - 2.22).abs() < 1e-9);
        assert!(char_width('a', 10.0, true) >= char_width('a', 10.0, false));
        assert!((char_width('業', 10.0, false) - 5.56).abs() < 1e-9);
    }

    #[test]
    fn short_text_is_one_line() {
        let lines = break_lines("Hello world", 12.0, false, 500.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "Hello world");
        assert!((lines[0].width - measure_width("Hello world", 12.0, false)).abs() < 1e-9);
    }

    #[test]
    fn wraps_at_spaces() {
        let max_width = measure_width("aaa bbb", 10.0, false) + 0.01;
        let lines = break_lines("aaa bbb ccc", 10.0, false, max_width);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn newlines_force_breaks_and_keep_empty_lines() {
        let lines = break_lines("one\n\ntwo", 10.0, false, 500.0);
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "", "two"]);
    }

    #[test]
    fn text_without_spaces_wraps_at_ideographs() {
        let text = "業てび夜導者日本語文字列処理試験";
        let lines = break_lines(text, 10.0, false, 60.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width <= 60.0 + 1e-9));
        let joined: String = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn line_fits_the_width_it_was_measured_at() {
        for content in ["item 1", "row 12", "Lorem ipsum dolor sit amet", "Page 3 of 7"] {
            for size in [7.0, 9.0, 10.0, 11.5, 13.0] {
                let natural = break_lines(content, size, false, f64::INFINITY)[0].width;
                let lines = break_lines(content, size, false, natural);
                assert_eq!(lines.len(), 1, "{content:?} at {size}pt re-wrapped");
            }
        }
    }

    #[test]
    fn overlong_word_gets_its_own_line() {
        let lines = break_lines("a supercalifragilistic b", 10.0, false, 30.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].text, "supercalifragilistic");
    }
}
