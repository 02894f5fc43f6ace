//! Staged, all-or-nothing application of parsed patches.
//!
//! Every file operation is resolved against an in-memory view first;
//! nothing touches disk until the whole patch has validated. The staged
//! view also lets later operations in one patch see the effects of earlier
//! ones (delete then re-add, move then update the mover's source, and so
//! on) without intermediate writes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use quill_edit::unified_diff;

use crate::error::{PatchError, PatchResult};
use crate::hunk::{Chunk, Hunk};

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Add,
    Delete,
    Update,
}

/// Per-file change record, populated only when the whole patch succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct FileChangeRecord {
    /// Path after the patch (the move destination for moved updates).
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub old_content: Option<String>,
    pub new_content: Option<String>,
    pub diff: String,
    /// Original path when an update moved the file.
    pub moved_from: Option<PathBuf>,
}

/// Result of applying a whole patch.
#[derive(Debug, Clone, Serialize)]
pub struct PatchOutcome {
    pub summary: String,
    pub changed_files: Vec<PathBuf>,
    /// Combined diff across every changed file.
    pub diff: String,
    pub records: Vec<FileChangeRecord>,
    pub additions: usize,
    pub deletions: usize,
}

/// Applies parsed hunks beneath `base_dir`, staging everything in memory and
/// committing writes only after every operation has resolved.
pub fn apply_hunks(hunks: &[Hunk], base_dir: &Path) -> PatchResult<PatchOutcome> {
    let mut stage = Stage::new(base_dir);
    for hunk in hunks {
        stage.stage_hunk(hunk)?;
    }
    stage.commit()
}

/// In-memory view of the patch in progress. `planned` maps each touched
/// path to its post-patch content, `None` meaning the path is deleted.
struct Stage<'a> {
    base_dir: &'a Path,
    planned: BTreeMap<PathBuf, Option<String>>,
    records: Vec<FileChangeRecord>,
    additions: usize,
    deletions: usize,
}

impl<'a> Stage<'a> {
    fn new(base_dir: &'a Path) -> Self {
        Self {
            base_dir,
            planned: BTreeMap::new(),
            records: Vec::new(),
            additions: 0,
            deletions: 0,
        }
    }

    /// Current content of `path` as this patch sees it: staged state first,
    /// then disk.
    fn current(&self, path: &Path) -> PatchResult<Option<String>> {
        if let Some(state) = self.planned.get(path) {
            return Ok(state.clone());
        }
        let full = self.base_dir.join(path);
        if !full.exists() {
            return Ok(None);
        }
        if full.is_dir() {
            return Err(PatchError::is_a_directory(path));
        }
        let raw = fs::read(&full).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8(raw).map_err(|_| PatchError::encoding(path))?;
        Ok(Some(content))
    }

    fn stage_hunk(&mut self, hunk: &Hunk) -> PatchResult<()> {
        match hunk {
            Hunk::AddFile { path, content } => self.stage_add(path, content),
            Hunk::DeleteFile { path } => self.stage_delete(path),
            Hunk::UpdateFile {
                path,
                move_to,
                chunks,
            } => self.stage_update(path, move_to.as_deref(), chunks),
        }
    }

    fn stage_add(&mut self, path: &Path, content: &str) -> PatchResult<()> {
        if self.current(path)?.is_some() {
            return Err(PatchError::already_exists(path));
        }
        self.planned
            .insert(path.to_path_buf(), Some(content.to_string()));
        self.push_record(path, ChangeKind::Add, None, Some(content.to_string()), None);
        Ok(())
    }

    fn stage_delete(&mut self, path: &Path) -> PatchResult<()> {
        let old = self
            .current(path)?
            .ok_or_else(|| PatchError::file_not_found(path))?;
        self.planned.insert(path.to_path_buf(), None);
        self.push_record(path, ChangeKind::Delete, Some(old), None, None);
        Ok(())
    }

    fn stage_update(
        &mut self,
        path: &Path,
        move_to: Option<&Path>,
        chunks: &[Chunk],
    ) -> PatchResult<()> {
        let old = self
            .current(path)?
            .ok_or_else(|| PatchError::file_not_found(path))?;
        let new = apply_chunks(&old, chunks, path)?;

        // A move to the original path is not a move.
        let destination = match move_to {
            Some(dest) if dest != path => dest,
            _ => path,
        };
        let moved = destination != path;
        if moved {
            self.planned.insert(path.to_path_buf(), None);
        }
        self.planned
            .insert(destination.to_path_buf(), Some(new.clone()));
        self.push_record(
            destination,
            ChangeKind::Update,
            Some(old),
            Some(new),
            moved.then(|| path.to_path_buf()),
        );
        Ok(())
    }

    fn push_record(
        &mut self,
        path: &Path,
        kind: ChangeKind,
        old_content: Option<String>,
        new_content: Option<String>,
        moved_from: Option<PathBuf>,
    ) {
        let label = path.display().to_string();
        let file_diff = unified_diff(
            &label,
            old_content.as_deref().unwrap_or(""),
            new_content.as_deref().unwrap_or(""),
        );
        self.additions += file_diff.additions;
        self.deletions += file_diff.deletions;
        debug!(
            "staged {kind:?} of {label} (+{} -{})",
            file_diff.additions, file_diff.deletions
        );
        self.records.push(FileChangeRecord {
            path: path.to_path_buf(),
            kind,
            old_content,
            new_content,
            diff: file_diff.text,
            moved_from,
        });
    }

    /// Writes every staged operation to disk, in patch order.
    fn commit(self) -> PatchResult<PatchOutcome> {
        for record in &self.records {
            let full = self.base_dir.join(&record.path);
            match record.kind {
                ChangeKind::Add | ChangeKind::Update => {
                    if let Some(parent) = full.parent() {
                        if !parent.as_os_str().is_empty() && !parent.exists() {
                            fs::create_dir_all(parent).map_err(|source| {
                                PatchError::CreateDir {
                                    path: parent.to_path_buf(),
                                    source,
                                }
                            })?;
                        }
                    }
                    let content = record.new_content.as_deref().unwrap_or("");
                    fs::write(&full, content).map_err(|source| PatchError::Write {
                        path: record.path.clone(),
                        source,
                    })?;
                    if let Some(moved_from) = &record.moved_from {
                        let old_full = self.base_dir.join(moved_from);
                        if old_full.exists() {
                            fs::remove_file(&old_full).map_err(|source| PatchError::Delete {
                                path: moved_from.clone(),
                                source,
                            })?;
                        }
                    }
                }
                ChangeKind::Delete => {
                    fs::remove_file(&full).map_err(|source| PatchError::Delete {
                        path: record.path.clone(),
                        source,
                    })?;
                }
            }
        }

        let added = self.count(ChangeKind::Add);
        let deleted = self.count(ChangeKind::Delete);
        let updated = self.count(ChangeKind::Update);
        let summary = format!(
            "Applied {} file change(s): {added} added, {deleted} deleted, {updated} updated",
            self.records.len()
        );
        info!("{summary}");

        let changed_files: Vec<PathBuf> = self.records.iter().map(|r| r.path.clone()).collect();
        let diff = self
            .records
            .iter()
            .map(|r| r.diff.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(PatchOutcome {
            summary,
            changed_files,
            diff,
            records: self.records,
            additions: self.additions,
            deletions: self.deletions,
        })
    }

    fn count(&self, kind: ChangeKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }
}

/// Applies chunks in order against a progressively modified line list.
fn apply_chunks(content: &str, chunks: &[Chunk], path: &Path) -> PatchResult<String> {
    let content = content.replace("\r\n", "\n");
    let keep_trailing_newline = content.ends_with('\n') || content.is_empty();
    let mut lines: Vec<String> = content.lines().map(String::from).collect();
    let mut cursor = 0usize;

    for chunk in chunks {
        if chunk.is_empty() {
            continue;
        }
        if chunk.is_insertion() {
            let at = if chunk.end_of_file {
                lines.len()
            } else {
                cursor.min(lines.len())
            };
            lines.splice(at..at, chunk.new_lines.iter().cloned());
            cursor = at + chunk.new_lines.len();
            continue;
        }

        let start = locate_window(&lines, &chunk.old_lines, cursor, chunk.end_of_file)
            .ok_or_else(|| {
                let context = chunk
                    .old_lines
                    .first()
                    .map(String::as_str)
                    .unwrap_or_default();
                PatchError::chunk_mismatch(path, context)
            })?;
        let end = start + chunk.old_lines.len();
        lines.splice(start..end, chunk.new_lines.iter().cloned());
        cursor = start + chunk.new_lines.len();
    }

    let mut result = lines.join("\n");
    if keep_trailing_newline && !result.is_empty() {
        result.push('\n');
    }
    Ok(result)
}

/// Locates a chunk's old lines as a contiguous window at or after `from`.
///
/// Exact equality is tried across the whole window first; failing that, a
/// relaxed pass anchors on the trimmed first line alone. End-of-file chunks
/// only match anchored at the tail.
fn locate_window(lines: &[String], old: &[String], from: usize, end_of_file: bool) -> Option<usize> {
    if old.is_empty() || old.len() > lines.len() {
        return None;
    }

    if end_of_file {
        let anchor = lines.len() - old.len();
        if anchor < from {
            return None;
        }
        if window_matches(lines, old, anchor) || lines[anchor].trim() == old[0].trim() {
            return Some(anchor);
        }
        return None;
    }

    let last_start = lines.len() - old.len();
    for start in from..=last_start {
        if window_matches(lines, old, start) {
            return Some(start);
        }
    }
    for start in from..=last_start {
        if lines[start].trim() == old[0].trim() {
            return Some(start);
        }
    }
    None
}

fn window_matches(lines: &[String], old: &[String], start: usize) -> bool {
    old.iter()
        .enumerate()
        .all(|(offset, line)| lines[start + offset] == *line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chunk(old: &[&str], new: &[&str]) -> Chunk {
        Chunk {
            old_lines: old.iter().map(|s| s.to_string()).collect(),
            new_lines: new.iter().map(|s| s.to_string()).collect(),
            end_of_file: false,
        }
    }

    #[test]
    fn applies_single_chunk() {
        let content = "a\nb\nc\n";
        let chunks = [chunk(&["a", "b"], &["a", "B"])];
        let result = apply_chunks(content, &chunks, Path::new("t")).unwrap();
        assert_eq!(result, "a\nB\nc\n");
    }

    #[test]
    fn chunks_apply_progressively() {
        let content = "one\ntwo\nthree\nfour\n";
        let chunks = [
            chunk(&["one"], &["1"]),
            chunk(&["three"], &["3"]),
        ];
        let result = apply_chunks(content, &chunks, Path::new("t")).unwrap();
        assert_eq!(result, "1\ntwo\n3\nfour\n");
    }

    #[test]
    fn relaxed_pass_anchors_on_first_line() {
        // The second context line drifted, but the first line still anchors
        // the window.
        let content = "fn main() {\n    actual_body();\n}\n";
        let chunks = [chunk(
            &["fn main() {", "    expected_body();", "}"],
            &["fn main() {", "    patched();", "}"],
        )];
        let result = apply_chunks(content, &chunks, Path::new("t")).unwrap();
        assert_eq!(result, "fn main() {\n    patched();\n}\n");
    }

    #[test]
    fn unlocatable_chunk_is_a_mismatch() {
        let content = "a\nb\n";
        let chunks = [chunk(&["zzz"], &["yyy"])];
        let err = apply_chunks(content, &chunks, Path::new("t")).unwrap_err();
        assert!(matches!(err, PatchError::ChunkMismatch { .. }));
    }

    #[test]
    fn end_of_file_chunk_matches_tail_only() {
        let content = "x\ny\nx\n";
        let mut tail = chunk(&["x"], &["x", "appended"]);
        tail.end_of_file = true;
        let result = apply_chunks(content, &[tail], Path::new("t")).unwrap();
        // The final "x" is replaced, not the first.
        assert_eq!(result, "x\ny\nx\nappended\n");
    }

    #[test]
    fn preserves_missing_trailing_newline() {
        let content = "a\nb";
        let chunks = [chunk(&["b"], &["B"])];
        let result = apply_chunks(content, &chunks, Path::new("t")).unwrap();
        assert_eq!(result, "a\nB");
    }

    #[test]
    fn insertion_chunk_appends_at_cursor() {
        let content = "a\nb\n";
        let chunks = [
            chunk(&["a"], &["a"]),
            chunk(&[], &["inserted"]),
        ];
        let result = apply_chunks(content, &chunks, Path::new("t")).unwrap();
        assert_eq!(result, "a\ninserted\nb\n");
    }
}
