//! Atomic multi-fragment edit orchestration for a single file.
//!
//! All operations are validated and applied against an in-memory buffer;
//! the file is written exactly once, and only after every operation has
//! resolved. A failure anywhere discards the buffer and leaves disk
//! untouched.

use std::fs;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cascade;
use crate::diff::{FileDiff, unified_diff};
use crate::edit::atomic_write;
use crate::error::{EditError, EditResult};
use crate::text::{detect_line_ending, normalize_line_endings, restore_line_endings};

/// One substitution in a multi-edit sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOperation {
    pub old: String,
    pub new: String,
    #[serde(default)]
    pub replace_all: bool,
}

/// How one operation of a successful sequence resolved.
#[derive(Debug, Clone, Serialize)]
pub struct EditReport {
    pub index: usize,
    pub strategy: &'static str,
    pub occurrences: usize,
}

/// Result of a successful multi-edit.
#[derive(Debug, Clone, Serialize)]
pub struct MultiEditOutcome {
    pub title: String,
    pub diff: String,
    pub additions: usize,
    pub deletions: usize,
    pub per_edit: Vec<EditReport>,
}

/// Applies an ordered list of substitutions to one file atomically.
///
/// Operations resolve sequentially against the buffer's current state, so a
/// later edit may target text an earlier edit introduced. Overlap between
/// operations is checked against the *original* content only; conflicts that
/// appear only after earlier edits run are not detected.
pub fn multi_edit(path: &Path, edits: &[EditOperation]) -> EditResult<MultiEditOutcome> {
    if edits.is_empty() {
        return Err(EditError::EmptyEditList);
    }
    for (index, op) in edits.iter().enumerate() {
        if op.old.is_empty() {
            return Err(EditError::malformed_edit(index, "old text is empty"));
        }
        if op.old == op.new {
            return Err(EditError::malformed_edit(
                index,
                "old and new text are identical",
            ));
        }
    }

    if !path.exists() {
        return Err(EditError::not_found(path));
    }
    if path.is_dir() {
        return Err(EditError::is_a_directory(path));
    }

    let raw = fs::read(path).map_err(|source| EditError::read(path, source))?;
    let original = String::from_utf8(raw).map_err(|_| EditError::encoding(path))?;

    let ending = detect_line_ending(&original);
    let content = normalize_line_endings(&original).into_owned();
    let normalized: Vec<EditOperation> = edits
        .iter()
        .map(|op| EditOperation {
            old: normalize_line_endings(&op.old).into_owned(),
            new: normalize_line_endings(&op.new).into_owned(),
            replace_all: op.replace_all,
        })
        .collect();

    detect_conflicts(&content, &normalized)?;

    let mut buffer = content.clone();
    let mut per_edit = Vec::with_capacity(normalized.len());
    for (index, op) in normalized.iter().enumerate() {
        match cascade::substitute(&buffer, &op.old, &op.new, op.replace_all) {
            Ok(substitution) => {
                per_edit.push(EditReport {
                    index,
                    strategy: substitution.strategy,
                    occurrences: substitution.occurrences,
                });
                buffer = substitution.content;
            }
            Err(source) => {
                return Err(EditError::OperationFailed {
                    index,
                    source: Box::new(source),
                });
            }
        }
    }

    atomic_write(path, &restore_line_endings(&buffer, ending))
        .map_err(|source| EditError::write(path, source))?;
    info!("applied {} edit(s) to {}", normalized.len(), path.display());

    let title = path.display().to_string();
    let FileDiff {
        text,
        additions,
        deletions,
    } = unified_diff(&title, &content, &buffer);
    Ok(MultiEditOutcome {
        title,
        diff: text,
        additions,
        deletions,
        per_edit,
    })
}

/// Pre-flight conflict check over the original content.
///
/// Every literal occurrence span of each operation's old text is compared
/// pairwise; any overlap rejects the whole sequence before anything runs.
fn detect_conflicts(content: &str, edits: &[EditOperation]) -> EditResult<()> {
    let spans: Vec<Vec<Range<usize>>> = edits
        .iter()
        .map(|op| {
            content
                .match_indices(op.old.as_str())
                .map(|(at, matched)| at..at + matched.len())
                .collect()
        })
        .collect();

    for first in 0..edits.len() {
        for second in first + 1..edits.len() {
            let overlapping = spans[first].iter().any(|a| {
                spans[second]
                    .iter()
                    .any(|b| a.start < b.end && b.start < a.end)
            });
            if overlapping {
                return Err(EditError::ConflictingEdits { first, second });
            }
        }
    }
    Ok(())
}
