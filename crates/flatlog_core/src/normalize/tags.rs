//! Tag normalizer.
//!
//! # Responsibility
//! - Parse bracketed, comma-separated tag strings into tag lists.
//! - Inject the marker tag, deduplicate and sort.
//!
//! # Invariants
//! - Normalized tags are unique, sorted and contain the marker exactly once.
//! - A tag never contains whitespace.

use crate::error::{ConvertError, ConvertResult};
use crate::model::note::NoteRecord;
use log::error;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Marker tag appended to every emitted note unless configured otherwise.
pub const DEFAULT_MARKER_TAG: &str = "mres";

/// Tag list content error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// Tag string is not wrapped in `[` and `]`.
    Unbracketed(String),
    /// A tag contains whitespace.
    Whitespace(String),
    /// Configured marker tag is blank.
    EmptyMarker,
}

impl Display for TagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unbracketed(raw) => write!(f, "tag list `{raw}` is not enclosed in brackets"),
            Self::Whitespace(tag) => write!(f, "space detected in tag `{tag}`"),
            Self::EmptyMarker => write!(f, "marker tag cannot be empty"),
        }
    }
}

impl Error for TagError {}

/// One note whose tag list is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFailure {
    pub index: usize,
    pub title: String,
    pub error: TagError,
}

impl Display for TagFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} title=`{}`: {}", self.index, self.title, self.error)
    }
}

/// Parses a raw tag string such as `[errand, home,]` into its tags.
///
/// Brackets and one trailing comma are stripped, entries are trimmed and
/// empty entries dropped. Source order is kept.
pub fn parse_tag_list(raw: &str) -> Result<Vec<String>, TagError> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| TagError::Unbracketed(trimmed.to_string()))?
        .trim();
    let inner = inner.strip_suffix(',').unwrap_or(inner);

    let mut tags = Vec::new();
    for tag in inner.split(',').map(str::trim) {
        if tag.is_empty() {
            continue;
        }
        if tag.chars().any(char::is_whitespace) {
            return Err(TagError::Whitespace(tag.to_string()));
        }
        tags.push(tag.to_string());
    }
    Ok(tags)
}

/// Checks that a marker tag would itself pass tag validation.
pub fn validate_marker_tag(marker: &str) -> Result<(), TagError> {
    if marker.trim().is_empty() {
        return Err(TagError::EmptyMarker);
    }
    if marker.chars().any(char::is_whitespace) {
        return Err(TagError::Whitespace(marker.to_string()));
    }
    Ok(())
}

/// Parses a raw tag string and returns the sorted, deduplicated tag set
/// including `marker`.
pub fn normalize_tag_list(raw: &str, marker: &str) -> Result<Vec<String>, TagError> {
    let mut unique: BTreeSet<String> = parse_tag_list(raw)?.into_iter().collect();
    unique.insert(marker.to_string());
    Ok(unique.into_iter().collect())
}

/// Normalizes the tags of every note in the batch.
///
/// # Errors
/// Returns `ConvertError::InvalidTags` naming each offending note's title.
/// No record is updated in that case.
pub fn normalize_tags_for(notes: &[NoteRecord], marker: &str) -> ConvertResult<()> {
    let mut normalized = Vec::with_capacity(notes.len());
    let mut failures = Vec::new();

    for note in notes {
        match normalize_tag_list(note.tags_raw(), marker) {
            Ok(tags) => normalized.push(tags),
            Err(error) => failures.push(TagFailure {
                index: note.index(),
                title: note.title().to_string(),
                error,
            }),
        }
    }

    if !failures.is_empty() {
        error!(
            "event=tags_normalize module=normalize status=error invalid={} total={}",
            failures.len(),
            notes.len()
        );
        return Err(ConvertError::InvalidTags(failures));
    }

    for (note, tags) in notes.iter().zip(normalized) {
        note.set_tags(tags)?;
    }
    Ok(())
}
