//! Flat-log conversion entry point.
//!
//! # Responsibility
//! - Run split, extract, normalize and emit stages in order.
//! - Validate the whole batch before the first document is written.
//!
//! # Invariants
//! - The output directory is checked before any input is read.
//! - Any validation failure means zero documents are written.
//! - Returned paths are in log order.

use crate::emit::document::assemble_documents;
use crate::emit::writer::{write_documents, WritePolicy};
use crate::error::{ConvertError, ConvertResult};
use crate::model::note::NoteRecord;
use crate::normalize::datetime::normalize_datetimes;
use crate::normalize::filename::assign_filenames;
use crate::normalize::tags::{normalize_tags_for, validate_marker_tag, DEFAULT_MARKER_TAG};
use crate::parse::extractor::decompose_notes;
use crate::parse::splitter::split_notes;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Options controlling one conversion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Replace documents that already exist in the output directory.
    pub overwrite_ok: bool,
    /// Tag appended to every note.
    pub marker_tag: String,
    /// Validate and plan without writing documents.
    pub dry_run: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            overwrite_ok: false,
            marker_tag: DEFAULT_MARKER_TAG.to_string(),
            dry_run: false,
        }
    }
}

/// Checks that `path` exists and is a directory.
pub fn validate_output_dir(path: &Path) -> ConvertResult<()> {
    if !path.exists() {
        return Err(ConvertError::InvalidOutputDir {
            path: path.to_path_buf(),
            reason: "path does not exist",
        });
    }
    if !path.is_dir() {
        return Err(ConvertError::InvalidOutputDir {
            path: path.to_path_buf(),
            reason: "path is not a directory",
        });
    }
    Ok(())
}

/// Reads the whole flat log as UTF-8 text.
pub fn read_flat_log(path: &Path) -> ConvertResult<String> {
    fs::read_to_string(path).map_err(|source| ConvertError::ReadInput {
        path: path.to_path_buf(),
        source,
    })
}

/// Runs every validation and enrichment stage over raw log text.
///
/// Filename probing happens in a scratch directory created under
/// `probe_parent`.
pub fn prepare_notes(
    text: &str,
    probe_parent: &Path,
    marker_tag: &str,
) -> ConvertResult<Vec<NoteRecord>> {
    let blocks = split_notes(text)?;
    info!(
        "event=notes_split module=pipeline status=ok count={}",
        blocks.len()
    );

    let notes = decompose_notes(&blocks)?;
    normalize_datetimes(&notes)?;
    assign_filenames(&notes, probe_parent)?;
    normalize_tags_for(&notes, marker_tag)?;
    Ok(notes)
}

/// Converts a flat log into one document per note.
///
/// Equivalent to `convert_flat_log_with` using default options and the given
/// overwrite flag.
pub fn convert_flat_log(
    in_path: &Path,
    out_dir: &Path,
    overwrite_ok: bool,
) -> ConvertResult<Vec<PathBuf>> {
    let options = ConvertOptions {
        overwrite_ok,
        ..ConvertOptions::default()
    };
    convert_flat_log_with(in_path, out_dir, &options)
}

/// Converts a flat log into one document per note.
///
/// # Side effects
/// - Creates and removes a hidden scratch directory inside `out_dir`.
/// - Writes documents into `out_dir` unless `dry_run` is set.
/// - Emits `convert` logging events with counts and duration.
///
/// # Errors
/// Any `ConvertError`; see the variant docs. All are fatal to the run.
pub fn convert_flat_log_with(
    in_path: &Path,
    out_dir: &Path,
    options: &ConvertOptions,
) -> ConvertResult<Vec<PathBuf>> {
    let started_at = Instant::now();
    info!(
        "event=convert module=pipeline status=start overwrite_ok={} dry_run={}",
        options.overwrite_ok, options.dry_run
    );

    match run(in_path, out_dir, options) {
        Ok(paths) => {
            info!(
                "event=convert module=pipeline status=ok written={} duration_ms={}",
                paths.len(),
                started_at.elapsed().as_millis()
            );
            Ok(paths)
        }
        Err(err) => {
            let message = err.to_string();
            error!(
                "event=convert module=pipeline status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                message.lines().next().unwrap_or_default()
            );
            Err(err)
        }
    }
}

fn run(in_path: &Path, out_dir: &Path, options: &ConvertOptions) -> ConvertResult<Vec<PathBuf>> {
    validate_output_dir(out_dir)?;
    validate_marker_tag(&options.marker_tag).map_err(ConvertError::InvalidMarkerTag)?;

    let text = read_flat_log(in_path)?;
    let notes = prepare_notes(&text, out_dir, &options.marker_tag)?;
    let documents = assemble_documents(notes, out_dir)?;

    let policy = WritePolicy {
        overwrite_ok: options.overwrite_ok,
        dry_run: options.dry_run,
    };
    Ok(write_documents(&documents, policy)?)
}

#[cfg(test)]
mod tests {
    use super::{validate_output_dir, ConvertOptions};
    use crate::error::ConvertError;

    #[test]
    fn default_options_refuse_overwrite_and_use_marker() {
        let options = ConvertOptions::default();
        assert!(!options.overwrite_ok);
        assert!(!options.dry_run);
        assert_eq!(options.marker_tag, "mres");
    }

    #[test]
    fn output_dir_must_exist_and_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        validate_output_dir(dir.path()).unwrap();

        let missing = dir.path().join("missing");
        assert!(matches!(
            validate_output_dir(&missing),
            Err(ConvertError::InvalidOutputDir { .. })
        ));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let err = validate_output_dir(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
