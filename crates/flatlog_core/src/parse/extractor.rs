//! Field extractor.
//!
//! # Responsibility
//! - Decompose one note block into timestamp, title, content and tag string.
//! - Aggregate per-block failures so a whole batch is diagnosed at once.
//!
//! # Invariants
//! - Sub-matchers run left to right; each consumes only its own field.
//! - The title ends at the first `.` or `?`; titles cannot carry sentence
//!   punctuation.
//! - Every extracted field is non-empty.

use crate::error::{ConvertError, ConvertResult};
use crate::model::note::{NoteFields, NoteRecord};
use log::{debug, error};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

const FIELD_SEPARATOR: &str = " - ";
const TAGS_MARKER: &str = " tags: ";
const TITLE_TERMINATORS: [char; 2] = ['.', '?'];

static TIMESTAMP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("valid timestamp regex"));

/// Position in the note layout where extraction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    Datetime,
    Separator,
    Title,
    Content,
    Tags,
}

impl Display for NoteField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Datetime => "datetime",
            Self::Separator => "separator",
            Self::Title => "title",
            Self::Content => "content",
            Self::Tags => "tags",
        };
        f.write_str(name)
    }
}

/// Reason one block did not satisfy the note layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractError {
    pub field: NoteField,
    pub reason: &'static str,
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl Error for ExtractError {}

/// One block that failed extraction, kept with its raw text for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedNote {
    pub index: usize,
    pub raw_text: String,
    pub error: ExtractError,
}

impl Display for UnmatchedNote {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} ({}):", self.index, self.error)?;
        for line in self.raw_text.lines() {
            write!(f, "\n      {line}")?;
        }
        Ok(())
    }
}

fn fail<T>(field: NoteField, reason: &'static str) -> Result<T, ExtractError> {
    Err(ExtractError { field, reason })
}

fn take_timestamp(rest: &str) -> Result<(&str, &str), ExtractError> {
    match TIMESTAMP_RE.find(rest) {
        Some(found) => Ok((found.as_str(), &rest[found.end()..])),
        None => fail(NoteField::Datetime, "expected `YYYY-MM-DD HH:MM:SS` at block start"),
    }
}

fn take_separator(rest: &str) -> Result<&str, ExtractError> {
    match rest.strip_prefix(FIELD_SEPARATOR) {
        Some(after) => Ok(after),
        None => fail(NoteField::Separator, "expected ` - ` after the timestamp"),
    }
}

fn take_title(rest: &str) -> Result<(&str, &str), ExtractError> {
    let Some(end) = rest.find(TITLE_TERMINATORS) else {
        return fail(NoteField::Title, "no `.` or `?` terminating the title");
    };
    let title = &rest[..end];
    if title.contains('\n') {
        return fail(NoteField::Title, "title runs past the end of its line");
    }
    if title.trim().is_empty() {
        return fail(NoteField::Title, "title is empty");
    }
    // Terminators are ASCII, so `end + 1` is a char boundary.
    match rest[end + 1..].strip_prefix(' ') {
        Some(after) => Ok((title, after)),
        None => fail(NoteField::Title, "title terminator must be followed by a space"),
    }
}

fn take_content(rest: &str) -> Result<(&str, &str), ExtractError> {
    let Some(end) = rest.find(TAGS_MARKER) else {
        return fail(NoteField::Content, "no ` tags: ` marker after the content");
    };
    let content = &rest[..end];
    if content.trim().is_empty() {
        return fail(NoteField::Content, "content is empty");
    }
    Ok((content, &rest[end + TAGS_MARKER.len()..]))
}

fn take_tags(rest: &str) -> Result<&str, ExtractError> {
    if rest.trim().is_empty() {
        return fail(NoteField::Tags, "tag list is empty");
    }
    Ok(rest)
}

/// Extracts the four raw fields of one note block.
///
/// # Errors
/// Returns the first field whose sub-matcher rejected the block.
pub fn extract_fields(block: &str) -> Result<NoteFields, ExtractError> {
    let (datetime_raw, rest) = take_timestamp(block)?;
    let rest = take_separator(rest)?;
    let (title, rest) = take_title(rest)?;
    let (content, rest) = take_content(rest)?;
    let tags_raw = take_tags(rest)?;

    Ok(NoteFields {
        datetime_raw: datetime_raw.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        tags_raw: tags_raw.to_string(),
    })
}

/// Decomposes every block into a `NoteRecord`.
///
/// # Errors
/// Returns `ConvertError::UnmatchedNotes` listing every failing block (index,
/// reason and raw text) when at least one block does not match.
pub fn decompose_notes(blocks: &[&str]) -> ConvertResult<Vec<NoteRecord>> {
    let mut records = Vec::with_capacity(blocks.len());
    let mut unmatched = Vec::new();

    for (index, block) in blocks.iter().enumerate() {
        match extract_fields(block) {
            Ok(fields) => records.push(NoteRecord::new(index, *block, fields)),
            Err(error) => {
                debug!(
                    "event=note_extract module=parse status=error index={} field={}",
                    index, error.field
                );
                unmatched.push(UnmatchedNote {
                    index,
                    raw_text: (*block).to_string(),
                    error,
                });
            }
        }
    }

    if !unmatched.is_empty() {
        error!(
            "event=notes_decompose module=parse status=error unmatched={} total={}",
            unmatched.len(),
            blocks.len()
        );
        return Err(ConvertError::UnmatchedNotes(unmatched));
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::{decompose_notes, extract_fields, NoteField};
    use crate::error::ConvertError;

    #[test]
    fn extracts_reference_note() {
        let fields = extract_fields(
            "2024-01-01 10:00:00 - Buy milk. Need milk for coffee tags: [errand, home,]",
        )
        .unwrap();
        assert_eq!(fields.datetime_raw, "2024-01-01 10:00:00");
        assert_eq!(fields.title, "Buy milk");
        assert_eq!(fields.content, "Need milk for coffee");
        assert_eq!(fields.tags_raw, "[errand, home,]");
    }

    #[test]
    fn title_stops_at_first_question_mark() {
        let fields =
            extract_fields("2024-01-01 10:00:00 - Why now? Because. Then more tags: [q]").unwrap();
        assert_eq!(fields.title, "Why now");
        assert_eq!(fields.content, "Because. Then more");
    }

    #[test]
    fn content_may_span_lines() {
        let fields =
            extract_fields("2024-01-01 10:00:00 - Plan. Line one\nline two tags: [a]").unwrap();
        assert_eq!(fields.content, "Line one\nline two");
    }

    #[test]
    fn content_stops_at_first_tags_marker() {
        let fields =
            extract_fields("2024-01-01 10:00:00 - T. mentions tag soup tags: [a]").unwrap();
        assert_eq!(fields.content, "mentions tag soup");
        assert_eq!(fields.tags_raw, "[a]");
    }

    #[test]
    fn reports_the_failing_field() {
        let cases = [
            ("2024-01-01 - T. c tags: [a]", NoteField::Datetime),
            ("2024-01-01 10:00:00 T. c tags: [a]", NoteField::Separator),
            ("2024-01-01 10:00:00 - no terminator tags: [a]", NoteField::Title),
            ("2024-01-01 10:00:00 - T.c tags: [a]", NoteField::Title),
            ("2024-01-01 10:00:00 - T. c [a]", NoteField::Content),
            ("2024-01-01 10:00:00 - T.   tags: [a]", NoteField::Content),
            ("2024-01-01 10:00:00 - T. c tags:  ", NoteField::Tags),
        ];
        for (block, field) in cases {
            let err = extract_fields(block).expect_err(block);
            assert_eq!(err.field, field, "block: {block}");
        }
    }

    #[test]
    fn decompose_reports_every_unmatched_block() {
        let blocks = [
            "2024-01-01 10:00:00 - Good. body tags: [a]",
            "2024-01-02 10:00:00 - missing terminator tags: [a]",
            "2024-01-03 10:00:00 - Good. body tags: [a]",
            "2024-01-04 10:00:00 Bad separator. body tags: [a]",
        ];
        let err = decompose_notes(&blocks).unwrap_err();
        let ConvertError::UnmatchedNotes(unmatched) = &err else {
            panic!("unexpected error: {err}");
        };
        let indexes: Vec<usize> = unmatched.iter().map(|note| note.index).collect();
        assert_eq!(indexes, vec![1, 3]);
        assert_eq!(unmatched[0].raw_text, blocks[1]);
    }

    #[test]
    fn unmatched_report_carries_whole_raw_block() {
        let long_bad = format!(
            "2024-01-02 10:00:00 - no terminator here but a long body {} tags: [a]",
            "describing the column conditions in detail ".repeat(3)
        );
        let blocks = ["2024-01-01 10:00:00 - Good. body tags: [a]", long_bad.as_str()];

        let message = decompose_notes(&blocks).unwrap_err().to_string();
        assert!(message.contains("number of notes without match: 1"), "{message}");
        assert!(message.contains(long_bad.as_str()), "{message}");
    }

    #[test]
    fn unmatched_report_keeps_every_line_of_multiline_blocks() {
        let blocks = ["2024-01-01 10:00:00 - no terminator\nsecond line tags: [a]"];

        let message = decompose_notes(&blocks).unwrap_err().to_string();
        assert!(message.contains("2024-01-01 10:00:00 - no terminator"), "{message}");
        assert!(message.contains("second line tags: [a]"), "{message}");
    }

    #[test]
    fn decompose_keeps_block_indexes() {
        let blocks = [
            "2024-01-01 10:00:00 - A. body tags: [a]",
            "2024-01-02 10:00:00 - B. body tags: [b]",
        ];
        let records = decompose_notes(&blocks).unwrap();
        assert_eq!(records[1].index(), 1);
        assert_eq!(records[1].title(), "B");
        assert_eq!(records[1].raw_text(), blocks[1]);
    }
}
