//! Note record model.
//!
//! # Responsibility
//! - Hold the raw block and the four extracted fields of one note.
//! - Accumulate derived values (canonical timestamp, filename, tags).
//!
//! # Invariants
//! - `datetime_raw`, `title`, `content` and `tags_raw` are non-empty.
//! - Derived fields are write-once; a second assignment is an error.
//! - A record lives for one pipeline run and is consumed by the assembler.

use once_cell::unsync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Raw fields extracted from one note block, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFields {
    /// Timestamp exactly as written in the log.
    pub datetime_raw: String,
    /// Text before the first `.` or `?`.
    pub title: String,
    /// Body text between the title terminator and ` tags: `.
    pub content: String,
    /// Bracketed, comma-separated tag list as written.
    pub tags_raw: String,
}

/// Error raised when a record field is assigned twice or read before assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    AlreadyAssigned { index: usize, field: &'static str },
    Missing { index: usize, field: &'static str },
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyAssigned { index, field } => {
                write!(f, "note #{index}: `{field}` was already assigned")
            }
            Self::Missing { index, field } => {
                write!(f, "note #{index}: `{field}` has not been derived yet")
            }
        }
    }
}

impl Error for RecordError {}

/// One parsed note, progressively enriched by pipeline stages.
#[derive(Debug, Clone)]
pub struct NoteRecord {
    index: usize,
    raw_text: String,
    fields: NoteFields,
    datetime: OnceCell<String>,
    filename: OnceCell<String>,
    tags: OnceCell<Vec<String>>,
}

impl NoteRecord {
    /// Creates a record for the block at `index` of the split log.
    pub fn new(index: usize, raw_text: impl Into<String>, fields: NoteFields) -> Self {
        Self {
            index,
            raw_text: raw_text.into(),
            fields,
            datetime: OnceCell::new(),
            filename: OnceCell::new(),
            tags: OnceCell::new(),
        }
    }

    /// Zero-based position of the block in the source log.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn datetime_raw(&self) -> &str {
        &self.fields.datetime_raw
    }

    pub fn title(&self) -> &str {
        &self.fields.title
    }

    pub fn content(&self) -> &str {
        &self.fields.content
    }

    pub fn tags_raw(&self) -> &str {
        &self.fields.tags_raw
    }

    /// Canonical ISO-8601 creation timestamp, once normalized.
    pub fn datetime(&self) -> Option<&str> {
        self.datetime.get().map(String::as_str)
    }

    /// Validated document filename, once derived.
    pub fn filename(&self) -> Option<&str> {
        self.filename.get().map(String::as_str)
    }

    /// Sorted, deduplicated tags including the marker tag, once normalized.
    pub fn tags(&self) -> Option<&[String]> {
        self.tags.get().map(Vec::as_slice)
    }

    pub fn set_datetime(&self, value: String) -> Result<(), RecordError> {
        self.datetime
            .set(value)
            .map_err(|_| self.already_assigned("datetime"))
    }

    pub fn set_filename(&self, value: String) -> Result<(), RecordError> {
        self.filename
            .set(value)
            .map_err(|_| self.already_assigned("filename"))
    }

    pub fn set_tags(&self, value: Vec<String>) -> Result<(), RecordError> {
        self.tags
            .set(value)
            .map_err(|_| self.already_assigned("tags"))
    }

    /// Returns the derived fields, failing on the first one still unset.
    pub(crate) fn require_derived(&self) -> Result<(&str, &str, &[String]), RecordError> {
        let datetime = self.datetime().ok_or(self.missing("datetime"))?;
        let filename = self.filename().ok_or(self.missing("filename"))?;
        let tags = self.tags().ok_or(self.missing("tags"))?;
        Ok((datetime, filename, tags))
    }

    fn already_assigned(&self, field: &'static str) -> RecordError {
        RecordError::AlreadyAssigned {
            index: self.index,
            field,
        }
    }

    fn missing(&self, field: &'static str) -> RecordError {
        RecordError::Missing {
            index: self.index,
            field,
        }
    }
}
