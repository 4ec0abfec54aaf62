//! Document assembler.
//!
//! # Responsibility
//! - Render the markdown body (title header + content).
//! - Build the `cdt`/`mdt`/`tags` metadata header.
//!
//! # Invariants
//! - `mdt` is the wall-clock time of assembly, never taken from the note.
//! - Rendered bodies always end with a newline.

use crate::error::ConvertResult;
use crate::model::note::NoteRecord;
use crate::normalize::datetime::format_iso;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const FRONT_MATTER_FENCE: &str = "---";

/// Metadata block written ahead of every document body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontMatter {
    /// Note creation time (canonical ISO-8601).
    pub cdt: String,
    /// Document generation time (ISO-8601).
    pub mdt: String,
    /// Sorted, deduplicated tags.
    pub tags: Vec<String>,
}

/// Assembled document ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Document {
    /// Serializes the document as YAML front matter followed by the body.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        let header = serde_yaml::to_string(&self.front_matter)?;
        Ok(format!(
            "{FRONT_MATTER_FENCE}\n{header}{FRONT_MATTER_FENCE}\n\n{}",
            self.body
        ))
    }
}

/// Title-cases text: the first letter of each word upper, the rest lower.
///
/// A word starts after any character that is neither alphanumeric nor an
/// apostrophe.
pub fn title_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_word = false;
    for ch in title.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = ch.is_alphanumeric() || ch == '\'';
        }
    }
    out
}

/// Renders the markdown body: `# Title`, blank line, content, newline.
pub fn render_body(title: &str, content: &str) -> String {
    format!("# {}\n\n{content}\n", title_case(title))
}

/// Builds the document for one enriched record at a given generation time.
///
/// # Errors
/// Returns `ConvertError::Record` when a derived field was never assigned.
pub fn assemble_document(
    note: NoteRecord,
    out_dir: &Path,
    generated_at: DateTime<Local>,
) -> ConvertResult<Document> {
    let (datetime, filename, tags) = note.require_derived()?;
    Ok(Document {
        path: out_dir.join(filename),
        front_matter: FrontMatter {
            cdt: datetime.to_string(),
            mdt: format_iso(&generated_at.naive_local()),
            tags: tags.to_vec(),
        },
        body: render_body(note.title(), note.content()),
    })
}

/// Assembles every record, stamping each with the current local time.
pub fn assemble_documents(notes: Vec<NoteRecord>, out_dir: &Path) -> ConvertResult<Vec<Document>> {
    notes
        .into_iter()
        .map(|note| assemble_document(note, out_dir, Local::now()))
        .collect()
}
