//! Error types for patch parsing and application.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for patch operations.
pub type PatchResult<T> = Result<T, PatchError>;

/// Errors that can occur while parsing or applying a patch.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The patch text violates the grammar.
    #[error("malformed patch at line {line}: {message}")]
    Malformed { message: String, line: usize },

    /// The patch parsed but contains no file sections.
    #[error("patch contains no file sections")]
    NoChanges,

    /// An Update or Delete target does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The target path is a directory.
    #[error("{path} is a directory")]
    IsADirectory { path: PathBuf },

    /// An Add File target already exists.
    #[error("file already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// An Update chunk's window could not be located in the target.
    #[error("could not locate chunk starting with '{context}' in {path}")]
    ChunkMismatch { path: PathBuf, context: String },

    /// The target file is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    Encoding { path: PathBuf },

    /// Failed to read a target file.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a target file.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create a parent directory.
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to delete a file.
    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    pub fn malformed(message: impl Into<String>, line: usize) -> Self {
        Self::Malformed {
            message: message.into(),
            line,
        }
    }

    pub fn file_not_found(path: &Path) -> Self {
        Self::FileNotFound {
            path: path.to_path_buf(),
        }
    }

    pub fn is_a_directory(path: &Path) -> Self {
        Self::IsADirectory {
            path: path.to_path_buf(),
        }
    }

    pub fn already_exists(path: &Path) -> Self {
        Self::AlreadyExists {
            path: path.to_path_buf(),
        }
    }

    pub fn chunk_mismatch(path: &Path, context: impl Into<String>) -> Self {
        Self::ChunkMismatch {
            path: path.to_path_buf(),
            context: context.into(),
        }
    }

    pub fn encoding(path: &Path) -> Self {
        Self::Encoding {
            path: path.to_path_buf(),
        }
    }
}
