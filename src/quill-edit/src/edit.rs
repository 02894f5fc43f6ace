//! Single-fragment edit orchestration.
//!
//! Reads the target once, resolves the fragment through the strategy
//! cascade, and writes the result once. Disk state is either exactly
//! unchanged or exactly the new content; a failed resolution never writes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::cascade;
use crate::diff::{FileDiff, unified_diff};
use crate::error::{EditError, EditResult};
use crate::text::{detect_line_ending, normalize_line_endings, restore_line_endings};

/// Result of a successful edit.
#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub title: String,
    pub diff: String,
    pub additions: usize,
    pub deletions: usize,
}

/// Replaces `old` with `new` in the file at `path`.
///
/// An empty `old` is creation mode: `new` is written verbatim and the diff
/// is taken against empty content. Otherwise the fragment is resolved via
/// the strategy cascade and must be unambiguous unless `replace_all` is set.
pub fn edit(path: &Path, old: &str, new: &str, replace_all: bool) -> EditResult<EditOutcome> {
    if old == new {
        return Err(EditError::IdenticalStrings);
    }
    if old.is_empty() {
        return create_file(path, new);
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
    let old = normalize_line_endings(old);
    let new = normalize_line_endings(new);

    let substitution = cascade::substitute(&content, &old, &new, replace_all)?;
    if substitution.strategy != "exact" {
        warn!(
            "resolved fragment in {} via the {} strategy",
            path.display(),
            substitution.strategy
        );
    }

    atomic_write(path, &restore_line_endings(&substitution.content, ending))
        .map_err(|source| EditError::write(path, source))?;
    info!(
        "edited {} ({} occurrence(s) via {})",
        path.display(),
        substitution.occurrences,
        substitution.strategy
    );

    Ok(outcome(path, &content, &substitution.content))
}

fn create_file(path: &Path, new: &str) -> EditResult<EditOutcome> {
    if path.is_dir() {
        return Err(EditError::is_a_directory(path));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| EditError::write(path, source))?;
        }
    }
    atomic_write(path, new).map_err(|source| EditError::write(path, source))?;
    info!("created {}", path.display());
    Ok(outcome(path, "", new))
}

fn outcome(path: &Path, old_content: &str, new_content: &str) -> EditOutcome {
    let title = path.display().to_string();
    let FileDiff {
        text,
        additions,
        deletions,
    } = unified_diff(&title, old_content, new_content);
    EditOutcome {
        title,
        diff: text,
        additions,
        deletions,
    }
}

/// Write-to-temp-then-rename in the target's directory, so readers never
/// observe a partially written file.
pub(crate) fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let temp_path = parent.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("file"),
        std::process::id()
    ));

    {
        let mut temp_file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.sync_all()?;
    }

    #[cfg(windows)]
    if path.exists() {
        fs::remove_file(path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            e
        })?;
    }

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn replaces_unique_fragment() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "main.rs", "fn main() {\n    old();\n}\n");

        let result = edit(&path, "old();", "new();", false).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "fn main() {\n    new();\n}\n"
        );
        assert_eq!(result.additions, 1);
        assert_eq!(result.deletions, 1);
        assert!(result.diff.contains("-    old();"));
    }

    #[test]
    fn round_trips_exactly() {
        let dir = TempDir::new().unwrap();
        let original = "alpha\nbeta\ngamma\n";
        let path = write_file(&dir, "roundtrip.txt", original);

        edit(&path, "beta", "delta", false).unwrap();
        edit(&path, "delta", "beta", false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn identical_fragments_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "x.txt", "content\n");

        let err = edit(&path, "content", "content", false).unwrap_err();
        assert!(matches!(err, EditError::IdenticalStrings));
    }

    #[test]
    fn ambiguous_fragment_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "x.txt", "foo foo foo");

        let err = edit(&path, "foo", "bar", false).unwrap_err();
        assert!(matches!(err, EditError::AmbiguousMatch { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "foo foo foo");
    }

    #[test]
    fn replace_all_substitutes_every_occurrence() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "x.txt", "foo foo foo");

        edit(&path, "foo", "bar", true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "bar bar bar");
    }

    #[test]
    fn line_trimmed_edit_preserves_indentation() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "x.txt", "  x = 1\n  y = 2");

        edit(&path, "x = 1\ny = 2", "x = 1\nz = 3", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "  x = 1\n  z = 3");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.txt");

        let err = edit(&path, "a", "b", false).unwrap_err();
        assert!(matches!(err, EditError::NotFound { .. }));
    }

    #[test]
    fn directory_target_is_rejected() {
        let dir = TempDir::new().unwrap();

        let err = edit(dir.path(), "a", "b", false).unwrap_err();
        assert!(matches!(err, EditError::IsADirectory { .. }));
    }

    #[test]
    fn creation_mode_writes_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/dir/new.txt");

        let result = edit(&path, "", "hello\nworld\n", false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
        assert_eq!(result.additions, 2);
        assert_eq!(result.deletions, 0);
    }

    #[test]
    fn creation_mode_rejects_directories() {
        let dir = TempDir::new().unwrap();

        let err = edit(dir.path(), "", "content", false).unwrap_err();
        assert!(matches!(err, EditError::IsADirectory { .. }));
    }

    #[test]
    fn crlf_files_keep_their_line_endings() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "dos.txt", "one\r\ntwo\r\nthree\r\n");

        edit(&path, "two", "2", false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\r\n2\r\nthree\r\n");
    }

    #[test]
    fn invalid_utf8_is_an_encoding_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bin.dat");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let err = edit(&path, "a", "b", false).unwrap_err();
        assert!(matches!(err, EditError::Encoding { .. }));
    }

    #[test]
    fn no_match_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "x.txt", "stable content\n");

        let err = edit(&path, "missing", "anything", false).unwrap_err();
        assert!(matches!(err, EditError::NoMatch { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "stable content\n");
    }

    #[test]
    fn outcome_serializes_for_dispatch() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "x.txt", "a\n");

        let result = edit(&path, "a", "b", false).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["additions"], 1);
        assert!(value["diff"].as_str().unwrap().contains("+b"));
    }
}
