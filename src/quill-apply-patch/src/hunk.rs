//! Hunk and chunk data structures for the patch grammar.

use std::path::{Path, PathBuf};

/// A contiguous block of old/new lines within an Update hunk.
///
/// Context lines appear in both `old_lines` and `new_lines`; removed lines
/// only in `old_lines`; added lines only in `new_lines`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chunk {
    /// Lines the target must currently contain, in order.
    pub old_lines: Vec<String>,
    /// Lines the window is replaced with.
    pub new_lines: Vec<String>,
    /// Whether this chunk is anchored at the end of the file.
    pub end_of_file: bool,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chunk with no old lines inserts instead of replacing a window.
    pub fn is_insertion(&self) -> bool {
        self.old_lines.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.old_lines.is_empty() && self.new_lines.is_empty()
    }
}

/// One parsed file section of a patch.
#[derive(Debug, Clone)]
pub enum Hunk {
    /// Create `path` with `content`.
    AddFile { path: PathBuf, content: String },
    /// Remove `path`.
    DeleteFile { path: PathBuf },
    /// Apply `chunks` to `path`, optionally writing the result to `move_to`
    /// and deleting the original.
    UpdateFile {
        path: PathBuf,
        move_to: Option<PathBuf>,
        chunks: Vec<Chunk>,
    },
}

impl Hunk {
    /// The path this hunk targets in the pre-patch tree.
    pub fn path(&self) -> &Path {
        match self {
            Self::AddFile { path, .. }
            | Self::DeleteFile { path }
            | Self::UpdateFile { path, .. } => path,
        }
    }

    /// The path that exists after this hunk is applied; `None` for deletes.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            Self::AddFile { path, .. } => Some(path),
            Self::DeleteFile { .. } => None,
            Self::UpdateFile { path, move_to, .. } => {
                Some(move_to.as_deref().unwrap_or(path.as_path()))
            }
        }
    }
}
