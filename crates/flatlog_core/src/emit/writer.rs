//! Document writer.
//!
//! # Responsibility
//! - Persist rendered documents under the overwrite policy.
//!
//! # Invariants
//! - An existing destination with `overwrite_ok == false` aborts the run;
//!   no later document is written.
//! - Every document is rendered before the first write.
//! - Without overwrite, a destination is created exclusively, never truncated.

use super::document::Document;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Error raised while persisting documents.
#[derive(Debug)]
pub enum WriteError {
    /// Destination exists and overwriting is disabled.
    DestinationExists(PathBuf),
    /// Metadata could not be serialized.
    Render {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    /// Filesystem write failed.
    Io { path: PathBuf, source: io::Error },
}

impl Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DestinationExists(path) => write!(
                f,
                "{} already exists; enable overwrite to replace it",
                path.display()
            ),
            Self::Render { path, source } => {
                write!(f, "failed to render {}: {source}", path.display())
            }
            Self::Io { path, source } => write!(f, "failed to write {}: {source}", path.display()),
        }
    }
}

impl Error for WriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DestinationExists(_) => None,
            Self::Render { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Write behaviour for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritePolicy {
    /// Replace documents that already exist.
    pub overwrite_ok: bool,
    /// Check destinations but write nothing.
    pub dry_run: bool,
}

/// Writes documents in order and returns the written paths.
///
/// With `dry_run` the destination checks still run and the returned paths are
/// the ones that would have been written.
///
/// # Errors
/// - `Render` when any document fails to serialize (nothing is written).
/// - `DestinationExists` at the first conflicting path; earlier documents
///   stay written.
/// - `Io` when the filesystem write fails.
pub fn write_documents(
    documents: &[Document],
    policy: WritePolicy,
) -> Result<Vec<PathBuf>, WriteError> {
    let mut rendered = Vec::with_capacity(documents.len());
    for document in documents {
        let text = document.render().map_err(|source| WriteError::Render {
            path: document.path.clone(),
            source,
        })?;
        rendered.push((&document.path, text));
    }

    let mut written = Vec::with_capacity(rendered.len());
    for (path, text) in rendered {
        let outcome = if policy.dry_run {
            info!(
                "event=document_write module=emit status=skipped dry_run=true path={}",
                path.display()
            );
            if path.exists() && !policy.overwrite_ok {
                Err(WriteError::DestinationExists(path.clone()))
            } else {
                Ok(())
            }
        } else {
            info!(
                "event=document_write module=emit status=start path={}",
                path.display()
            );
            write_one(path, &text, policy.overwrite_ok)
        };

        if let Err(err) = outcome {
            error!(
                "event=document_write module=emit status=error written={} error={}",
                written.len(),
                err
            );
            return Err(err);
        }
        written.push(path.clone());
    }

    Ok(written)
}

// Without overwrite, `create_new` makes the existence check and the create
// one filesystem operation.
fn write_one(path: &Path, text: &str, overwrite_ok: bool) -> Result<(), WriteError> {
    let io_error = |source: io::Error| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    if overwrite_ok {
        return fs::write(path, text).map_err(io_error);
    }

    let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(WriteError::DestinationExists(path.to_path_buf()));
        }
        Err(err) => return Err(io_error(err)),
    };
    file.write_all(text.as_bytes()).map_err(io_error)
}
