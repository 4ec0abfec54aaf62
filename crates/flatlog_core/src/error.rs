//! Batch-level error type for flat-log conversion.
//!
//! # Responsibility
//! - Collect every component error behind one type for `?` propagation.
//! - Render aggregated failures so one run pinpoints every bad note.
//!
//! # Invariants
//! - Every error is fatal to the whole batch.
//! - Aggregating variants carry all offending notes, never only the first.

use crate::emit::writer::WriteError;
use crate::model::note::RecordError;
use crate::normalize::datetime::DatetimeFailure;
use crate::normalize::filename::{FilenameCollision, FilenameFailure};
use crate::normalize::tags::{TagError, TagFailure};
use crate::parse::extractor::UnmatchedNote;
use crate::parse::splitter::SplitError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

pub type ConvertResult<T> = Result<T, ConvertError>;

#[derive(Debug)]
pub enum ConvertError {
    /// Output directory is missing or not a directory.
    InvalidOutputDir { path: PathBuf, reason: &'static str },
    /// Configured marker tag is not a valid tag.
    InvalidMarkerTag(TagError),
    /// Input log could not be read.
    ReadInput { path: PathBuf, source: io::Error },
    /// Log structure violates block boundary rules.
    Split(SplitError),
    /// Blocks that did not match the note layout.
    UnmatchedNotes(Vec<UnmatchedNote>),
    /// Notes whose timestamp could not be canonicalized.
    UnparseableDatetimes(Vec<DatetimeFailure>),
    /// Scratch directory for filename probing could not be created or removed.
    ProbeDir { path: PathBuf, source: io::Error },
    /// Derived filenames rejected by the filesystem.
    InvalidFilenames(Vec<FilenameFailure>),
    /// Filenames derived by more than one note.
    DuplicateFilenames(Vec<FilenameCollision>),
    /// Notes with invalid tag content.
    InvalidTags(Vec<TagFailure>),
    /// Record field assigned twice or read before assignment.
    Record(RecordError),
    /// Document could not be written.
    Write(WriteError),
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> std::fmt::Result {
    for item in items {
        write!(f, "\n  {item}")?;
    }
    Ok(())
}

impl Display for ConvertError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOutputDir { path, reason } => {
                write!(f, "invalid output directory {}: {reason}", path.display())
            }
            Self::InvalidMarkerTag(err) => write!(f, "invalid marker tag: {err}"),
            Self::ReadInput { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            Self::Split(err) => write!(f, "{err}"),
            Self::UnmatchedNotes(notes) => {
                let indexes: Vec<usize> = notes.iter().map(|note| note.index).collect();
                write!(
                    f,
                    "number of notes without match: {}; indexes: {indexes:?}",
                    notes.len()
                )?;
                write_list(f, notes)
            }
            Self::UnparseableDatetimes(failures) => {
                write!(
                    f,
                    "some note datetimes could not be parsed ({} failed):",
                    failures.len()
                )?;
                write_list(f, failures)
            }
            Self::ProbeDir { path, source } => write!(
                f,
                "filename probe directory error under {}: {source}",
                path.display()
            ),
            Self::InvalidFilenames(failures) => {
                write!(f, "{} derived file name(s) rejected:", failures.len())?;
                write_list(f, failures)
            }
            Self::DuplicateFilenames(collisions) => {
                write!(
                    f,
                    "{} file name(s) derived by more than one note:",
                    collisions.len()
                )?;
                write_list(f, collisions)
            }
            Self::InvalidTags(failures) => {
                write!(f, "{} note(s) with invalid tags:", failures.len())?;
                write_list(f, failures)
            }
            Self::Record(err) => write!(f, "{err}"),
            Self::Write(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConvertError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidMarkerTag(err) => Some(err),
            Self::ReadInput { source, .. } | Self::ProbeDir { source, .. } => Some(source),
            Self::Split(err) => Some(err),
            Self::Record(err) => Some(err),
            Self::Write(err) => Some(err),
            Self::InvalidOutputDir { .. }
            | Self::UnmatchedNotes(_)
            | Self::UnparseableDatetimes(_)
            | Self::InvalidFilenames(_)
            | Self::DuplicateFilenames(_)
            | Self::InvalidTags(_) => None,
        }
    }
}

impl From<SplitError> for ConvertError {
    fn from(value: SplitError) -> Self {
        Self::Split(value)
    }
}

impl From<RecordError> for ConvertError {
    fn from(value: RecordError) -> Self {
        Self::Record(value)
    }
}

impl From<WriteError> for ConvertError {
    fn from(value: WriteError) -> Self {
        Self::Write(value)
    }
}
