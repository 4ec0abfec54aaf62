//! Filename deriver.
//!
//! # Responsibility
//! - Derive a filesystem-safe document filename from a note title.
//! - Prove each candidate usable by creating it in a scratch directory.
//! - Reject batches where two notes derive the same filename.
//!
//! # Invariants
//! - The scratch directory is removed on every exit path.
//! - Candidates are single path components; they never escape the scratch
//!   or output directory.
//! - `clean_stem` is idempotent on names produced from dot-free titles
//!   (titles end at the first `.`, so every extracted title qualifies).

use crate::error::{ConvertError, ConvertResult};
use crate::model::note::NoteRecord;
use log::{error, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path};
use tempfile::TempDir;

/// Extension of every emitted document.
pub const DOCUMENT_EXTENSION: &str = "md";

const SCRATCH_DIR_PREFIX: &str = ".flatlog-probe-";
const TRAILING_PUNCTUATION: [char; 3] = ['?', ',', '.'];
const DISALLOWED_CHARS: [char; 6] = ['"', ',', '-', '\'', '?', '^'];

/// Reason a single filename candidate was rejected.
#[derive(Debug)]
pub enum FilenameError {
    /// Cleaning removed every character of the title.
    Empty,
    /// Candidate contains a path separator or names a special component.
    NotSingleComponent,
    /// The filesystem refused to create the candidate.
    Rejected(io::Error),
}

impl Display for FilenameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "cleaned name is empty"),
            Self::NotSingleComponent => write!(f, "name is not a single path component"),
            Self::Rejected(err) => write!(f, "filesystem rejected name: {err}"),
        }
    }
}

impl Error for FilenameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(err) => Some(err),
            Self::Empty | Self::NotSingleComponent => None,
        }
    }
}

/// One note whose derived filename is unusable.
#[derive(Debug)]
pub struct FilenameFailure {
    pub index: usize,
    pub title: String,
    pub candidate: String,
    pub error: FilenameError,
}

impl Display for FilenameFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} title=`{}` file name potentially invalid: `{}` ({})",
            self.index, self.title, self.candidate, self.error
        )
    }
}

/// Filename derived by more than one note in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCollision {
    pub filename: String,
    pub titles: Vec<String>,
}

impl Display for FilenameCollision {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "`{}` <- {:?}", self.filename, self.titles)
    }
}

/// Cleans a title into a filename stem (no extension).
///
/// Steps, in order: lowercase, trim, drop one trailing `?`, `,` or `.`,
/// spaces to underscores, remove disallowed characters.
pub fn clean_stem(title: &str) -> String {
    let lowered = title.to_lowercase();
    let trimmed = lowered.trim();
    let stripped = trimmed
        .strip_suffix(TRAILING_PUNCTUATION)
        .unwrap_or(trimmed);
    stripped
        .replace(' ', "_")
        .chars()
        .filter(|c| !DISALLOWED_CHARS.contains(c))
        .collect()
}

/// Derives the document filename for a title.
pub fn derive_filename(title: &str) -> String {
    format!("{}.{DOCUMENT_EXTENSION}", clean_stem(title))
}

/// Scratch directory used to prove candidate names are creatable.
///
/// Dropping the probe removes the directory; `close` does the same but
/// reports removal failures.
pub struct FilenameProbe {
    scratch: TempDir,
}

impl FilenameProbe {
    /// Creates a fresh hidden scratch directory inside `parent`.
    pub fn create_in(parent: &Path) -> ConvertResult<Self> {
        let scratch = tempfile::Builder::new()
            .prefix(SCRATCH_DIR_PREFIX)
            .tempdir_in(parent)
            .map_err(|source| ConvertError::ProbeDir {
                path: parent.to_path_buf(),
                source,
            })?;
        Ok(Self { scratch })
    }

    pub fn path(&self) -> &Path {
        self.scratch.path()
    }

    /// Creates and immediately removes `candidate` inside the scratch directory.
    pub fn check(&self, candidate: &str) -> Result<(), FilenameError> {
        let stem = candidate
            .strip_suffix(DOCUMENT_EXTENSION)
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap_or(candidate);
        if stem.is_empty() {
            return Err(FilenameError::Empty);
        }

        let mut components = Path::new(candidate).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == candidate => {}
            _ => return Err(FilenameError::NotSingleComponent),
        }

        let target = self.scratch.path().join(candidate);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(FilenameError::Rejected)?;
        drop(file);
        fs::remove_file(&target).map_err(FilenameError::Rejected)
    }

    /// Removes the scratch directory, surfacing removal errors.
    pub fn close(self) -> ConvertResult<()> {
        let path = self.scratch.path().to_path_buf();
        self.scratch
            .close()
            .map_err(|source| ConvertError::ProbeDir { path, source })
    }
}

fn find_collisions(notes: &[NoteRecord], names: &[String]) -> Vec<FilenameCollision> {
    let mut by_name: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (note, name) in notes.iter().zip(names) {
        by_name
            .entry(name.as_str())
            .or_default()
            .push(note.title().to_string());
    }
    by_name
        .into_iter()
        .filter(|(_, titles)| titles.len() > 1)
        .map(|(filename, titles)| FilenameCollision {
            filename: filename.to_string(),
            titles,
        })
        .collect()
}

fn derive_and_probe(probe: &FilenameProbe, notes: &[NoteRecord]) -> ConvertResult<Vec<String>> {
    let mut names = Vec::with_capacity(notes.len());
    let mut failures = Vec::new();

    for note in notes {
        let candidate = derive_filename(note.title());
        if let Err(error) = probe.check(&candidate) {
            failures.push(FilenameFailure {
                index: note.index(),
                title: note.title().to_string(),
                candidate: candidate.clone(),
                error,
            });
        }
        names.push(candidate);
    }

    if !failures.is_empty() {
        error!(
            "event=filenames_probe module=normalize status=error rejected={} total={}",
            failures.len(),
            notes.len()
        );
        return Err(ConvertError::InvalidFilenames(failures));
    }

    let collisions = find_collisions(notes, &names);
    if !collisions.is_empty() {
        error!(
            "event=filenames_probe module=normalize status=error collisions={}",
            collisions.len()
        );
        return Err(ConvertError::DuplicateFilenames(collisions));
    }

    Ok(names)
}

/// Derives, probes and assigns a filename to every note.
///
/// The scratch directory is created under `probe_parent` (normally the output
/// directory, so names are checked against the target filesystem).
///
/// # Errors
/// - `ProbeDir` when the scratch directory cannot be created or removed.
/// - `InvalidFilenames` listing every rejected candidate.
/// - `DuplicateFilenames` when two notes derive the same name.
pub fn assign_filenames(notes: &[NoteRecord], probe_parent: &Path) -> ConvertResult<()> {
    let probe = FilenameProbe::create_in(probe_parent)?;
    let names = match derive_and_probe(&probe, notes) {
        Ok(names) => names,
        Err(err) => {
            // Drop removes the scratch directory; the probe error wins.
            drop(probe);
            return Err(err);
        }
    };
    probe.close()?;

    for (note, name) in notes.iter().zip(names) {
        note.set_filename(name)?;
    }
    info!(
        "event=filenames_assign module=normalize status=ok count={}",
        notes.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{clean_stem, derive_filename, FilenameError, FilenameProbe};

    #[test]
    fn derives_reference_filename() {
        assert_eq!(derive_filename("Buy milk"), "buy_milk.md");
    }

    #[test]
    fn strips_one_trailing_punctuation_and_disallowed_chars() {
        assert_eq!(derive_filename("  What's up,  "), "whats_up.md");
        assert_eq!(derive_filename("Re-think \"caret\" ^ usage"), "rethink_caret__usage.md");
    }

    #[test]
    fn cleaning_is_idempotent_on_clean_names() {
        let titles = [
            "Buy milk",
            "What's up?",
            "Re-think ^plan",
            "HPLC run 2",
            "Trailing quirks ,'",
            "  ^-- arrows --^  ",
        ];
        for title in titles {
            let once = clean_stem(title);
            assert_eq!(clean_stem(&once), once, "title: {title}");
        }
    }

    #[test]
    fn probe_accepts_plain_names_and_leaves_nothing_behind() {
        let parent = tempfile::tempdir().unwrap();
        let probe = FilenameProbe::create_in(parent.path()).unwrap();
        probe.check("buy_milk.md").unwrap();
        assert!(!probe.path().join("buy_milk.md").exists());

        let scratch = probe.path().to_path_buf();
        probe.close().unwrap();
        assert!(!scratch.exists());
    }

    #[test]
    fn probe_rejects_path_like_and_empty_names() {
        let parent = tempfile::tempdir().unwrap();
        let probe = FilenameProbe::create_in(parent.path()).unwrap();

        assert!(matches!(
            probe.check("a/b.md"),
            Err(FilenameError::NotSingleComponent)
        ));
        assert!(matches!(
            probe.check("/etc.md"),
            Err(FilenameError::NotSingleComponent)
        ));
        assert!(matches!(probe.check(".md"), Err(FilenameError::Empty)));
    }

    #[test]
    fn probe_rejects_names_the_filesystem_refuses() {
        let parent = tempfile::tempdir().unwrap();
        let probe = FilenameProbe::create_in(parent.path()).unwrap();
        let too_long = format!("{}.md", "x".repeat(300));
        assert!(matches!(
            probe.check(&too_long),
            Err(FilenameError::Rejected(_))
        ));
    }
}
