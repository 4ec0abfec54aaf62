//! Core conversion logic for flatlog.
//! Turns one flat, timestamped note log into one front-matter markdown
//! document per note.

pub mod emit;
pub mod error;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod parse;
pub mod pipeline;

pub use emit::document::{assemble_documents, Document, FrontMatter};
pub use emit::writer::{write_documents, WriteError, WritePolicy};
pub use error::{ConvertError, ConvertResult};
pub use logging::{default_log_level, init_logging, LogDestination};
pub use model::note::{NoteFields, NoteRecord, RecordError};
pub use normalize::datetime::{normalize_datetimes, parse_timestamp, DatetimeFailure};
pub use normalize::filename::{
    assign_filenames, clean_stem, derive_filename, FilenameCollision, FilenameError,
    FilenameFailure, FilenameProbe, DOCUMENT_EXTENSION,
};
pub use normalize::tags::{
    normalize_tag_list, normalize_tags_for, parse_tag_list, TagError, TagFailure,
    DEFAULT_MARKER_TAG,
};
pub use parse::extractor::{decompose_notes, extract_fields, ExtractError, NoteField, UnmatchedNote};
pub use parse::splitter::{split_notes, SplitError, NOTE_SEPARATOR};
pub use pipeline::{
    convert_flat_log, convert_flat_log_with, prepare_notes, read_flat_log, validate_output_dir,
    ConvertOptions,
};
