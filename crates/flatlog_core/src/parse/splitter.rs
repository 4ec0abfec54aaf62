//! Note splitter.
//!
//! # Responsibility
//! - Split the flat log into note blocks at `]` + blank line + timestamp.
//!
//! # Invariants
//! - Blocks keep source order; joining them with `NOTE_SEPARATOR`
//!   reproduces the log (minus trailing line endings).
//! - Every block starts with an ASCII digit and ends with `]`.

use crate::logging::sanitize_message;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const EXCERPT_CHARS: usize = 60;
const TAIL_CHARS: usize = 40;

/// Text removed between two adjacent blocks.
pub const NOTE_SEPARATOR: &str = "\n\n";

// The match starts at the `]` closing the previous note; the next note begins
// `1 + NOTE_SEPARATOR.len()` bytes later.
static NOTE_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\]\n\n\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("valid note boundary regex")
});

/// Structural error in the flat log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitError {
    /// Log contains no text at all.
    EmptyLog,
    /// Block does not begin with the first digit of a timestamp.
    BadStart { index: usize, excerpt: String },
    /// Block does not end with the `]` of a tag list.
    BadEnd { index: usize, excerpt: String },
}

impl Display for SplitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyLog => write!(f, "malformed log: input contains no notes"),
            Self::BadStart { index, excerpt } => write!(
                f,
                "malformed log: note #{index} does not start with a timestamp: `{excerpt}`"
            ),
            Self::BadEnd { index, excerpt } => write!(
                f,
                "malformed log: note #{index} does not end with `]`: `{excerpt}`"
            ),
        }
    }
}

impl Error for SplitError {}

/// Splits a flat log into raw note blocks.
///
/// Trailing `\n`/`\r` at the very end of the log are ignored. The splitter
/// validates but never repairs blocks.
///
/// # Errors
/// - `EmptyLog` when the log is blank.
/// - `BadStart`/`BadEnd` for the first block violating the boundary shape.
pub fn split_notes(text: &str) -> Result<Vec<&str>, SplitError> {
    let text = text.trim_end_matches(['\n', '\r']);
    if text.trim().is_empty() {
        return Err(SplitError::EmptyLog);
    }

    let mut blocks = Vec::new();
    let mut start = 0;
    for boundary in NOTE_BOUNDARY_RE.find_iter(text) {
        let end = boundary.start() + 1;
        blocks.push(&text[start..end]);
        start = end + NOTE_SEPARATOR.len();
    }
    blocks.push(&text[start..]);

    for (index, block) in blocks.iter().enumerate() {
        if !block.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(SplitError::BadStart {
                index,
                excerpt: sanitize_message(block, EXCERPT_CHARS),
            });
        }
        if !block.ends_with(']') {
            let tail_start = block
                .char_indices()
                .rev()
                .nth(TAIL_CHARS)
                .map(|(idx, _)| idx)
                .unwrap_or(0);
            return Err(SplitError::BadEnd {
                index,
                excerpt: sanitize_message(&block[tail_start..], EXCERPT_CHARS),
            });
        }
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::{split_notes, SplitError, NOTE_SEPARATOR};

    const TWO_NOTES: &str = "2024-01-01 10:00:00 - One. First body tags: [a]\n\n\
                             2024-01-02 11:30:00 - Two. Second body tags: [b, c]";

    #[test]
    fn splits_on_tag_close_blank_line_and_timestamp() {
        let blocks = split_notes(TWO_NOTES).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("2024-01-01"));
        assert!(blocks[1].ends_with("[b, c]"));
    }

    #[test]
    fn split_is_lossless_and_order_preserving() {
        let blocks = split_notes(TWO_NOTES).unwrap();
        assert_eq!(blocks.join(NOTE_SEPARATOR), TWO_NOTES);
    }

    #[test]
    fn blank_line_without_timestamp_does_not_split() {
        let text = "2024-01-01 10:00:00 - One. Body [x]\n\nstill body tags: [a]";
        let blocks = split_notes(text).unwrap();
        assert_eq!(blocks, vec![text]);
    }

    #[test]
    fn trailing_newlines_are_ignored() {
        let text = format!("{TWO_NOTES}\n\n");
        assert_eq!(split_notes(&text).unwrap().len(), 2);
    }

    #[test]
    fn empty_log_is_rejected() {
        assert_eq!(split_notes("\n\n").unwrap_err(), SplitError::EmptyLog);
    }

    #[test]
    fn block_without_leading_timestamp_is_rejected() {
        let err = split_notes("note - Bad. body tags: [a]").unwrap_err();
        assert!(matches!(err, SplitError::BadStart { index: 0, .. }));
    }

    #[test]
    fn block_without_closing_bracket_is_rejected() {
        let text = "2024-01-01 10:00:00 - One. body tags: [a]\n\n\
                    2024-01-02 10:00:00 - Two. body tags: [b";
        let err = split_notes(text).unwrap_err();
        assert!(matches!(err, SplitError::BadEnd { index: 1, .. }));
    }
}
