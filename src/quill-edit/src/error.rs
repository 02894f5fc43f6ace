//! Error types for the edit engine.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for edit operations.
pub type EditResult<T> = Result<T, EditError>;

/// Errors that can occur while resolving or applying substitutions.
#[derive(Debug, Error)]
pub enum EditError {
    /// The target file does not exist.
    #[error("file not found: {path}")]
    NotFound { path: PathBuf },

    /// The target path is a directory.
    #[error("{path} is a directory")]
    IsADirectory { path: PathBuf },

    /// The old and new fragments are the same text.
    #[error("old and new text are identical")]
    IdenticalStrings,

    /// No strategy produced a candidate for the fragment.
    #[error("could not find '{search}' in file (strategies tried: {})", .strategies_tried.join(", "))]
    NoMatch {
        search: String,
        strategies_tried: Vec<&'static str>,
    },

    /// The fragment matched more than one region of the file.
    #[error(
        "found {count} possible matches for '{search}' via the {strategy} strategy; \
         add surrounding context to make the fragment unique, or use replace_all"
    )]
    AmbiguousMatch {
        search: String,
        count: usize,
        strategy: &'static str,
    },

    /// The file is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    /// multi_edit was called with no operations.
    #[error("no edits supplied")]
    EmptyEditList,

    /// An operation in a multi_edit sequence is invalid on its face.
    #[error("edit {index} is malformed: {reason}")]
    MalformedEdit { index: usize, reason: String },

    /// Two operations target overlapping spans of the original content.
    #[error("edits {first} and {second} overlap in the original content")]
    ConflictingEdits { first: usize, second: usize },

    /// An operation in a multi_edit sequence failed to resolve; nothing was
    /// written.
    #[error("edit {index} failed: {source}")]
    OperationFailed {
        index: usize,
        #[source]
        source: Box<EditError>,
    },

    /// Failed to read the target file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the target file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EditError {
    pub fn not_found(path: &Path) -> Self {
        Self::NotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn is_a_directory(path: &Path) -> Self {
        Self::IsADirectory {
            path: path.to_path_buf(),
        }
    }

    pub fn encoding(path: &Path) -> Self {
        Self::Encoding {
            path: path.to_path_buf(),
        }
    }

    pub fn malformed_edit(index: usize, reason: impl Into<String>) -> Self {
        Self::MalformedEdit {
            index,
            reason: reason.into(),
        }
    }

    pub fn read(path: &Path, source: std::io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn write(path: &Path, source: std::io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}
