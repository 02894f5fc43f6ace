//! Line scanner for the patch grammar.
//!
//! The grammar is line-oriented with literal, case-sensitive markers:
//!
//! ```text
//! *** Begin Patch
//! *** Add File: path/new.txt
//! +line one
//! *** Delete File: path/old.txt
//! *** Update File: path/existing.txt
//! *** Move to: path/renamed.txt
//! @@ optional label
//!  context line
//! -removed line
//! +added line
//! *** End Patch
//! ```
//!
//! A hand-written state walk over the lines; no grammar machinery.

use std::path::PathBuf;

use crate::error::{PatchError, PatchResult};
use crate::hunk::{Chunk, Hunk};

pub const BEGIN_PATCH: &str = "*** Begin Patch";
pub const END_PATCH: &str = "*** End Patch";

const ADD_FILE: &str = "*** Add File: ";
const DELETE_FILE: &str = "*** Delete File: ";
const UPDATE_FILE: &str = "*** Update File: ";
const MOVE_TO: &str = "*** Move to: ";
const END_OF_FILE: &str = "*** End of File";
const CHUNK_HEADER: &str = "@@";

/// Parses patch text into an ordered list of hunks.
pub fn parse_patch(text: &str) -> PatchResult<Vec<Hunk>> {
    let text = text.replace("\r\n", "\n");
    let trimmed = text.trim();
    let lines: Vec<&str> = trimmed.lines().collect();

    if lines.first().copied() != Some(BEGIN_PATCH) {
        return Err(PatchError::malformed(
            format!("patch must start with '{BEGIN_PATCH}'"),
            1,
        ));
    }
    if lines.len() < 2 || lines.last().copied() != Some(END_PATCH) {
        return Err(PatchError::malformed(
            format!("patch must end with '{END_PATCH}'"),
            lines.len(),
        ));
    }

    let body = &lines[1..lines.len() - 1];
    let mut hunks = Vec::new();
    let mut index = 0;
    while index < body.len() {
        let line = body[index];
        if let Some(path) = line.strip_prefix(ADD_FILE) {
            let path = parse_path(path, index)?;
            let (content, next) = parse_add_body(body, index + 1)?;
            hunks.push(Hunk::AddFile { path, content });
            index = next;
        } else if let Some(path) = line.strip_prefix(DELETE_FILE) {
            hunks.push(Hunk::DeleteFile {
                path: parse_path(path, index)?,
            });
            index += 1;
        } else if let Some(path) = line.strip_prefix(UPDATE_FILE) {
            let path = parse_path(path, index)?;
            let (hunk, next) = parse_update_section(body, index + 1, path)?;
            hunks.push(hunk);
            index = next;
        } else {
            return Err(PatchError::malformed(
                format!("expected a file section marker, found '{line}'"),
                line_number(index),
            ));
        }
    }

    if hunks.is_empty() {
        return Err(PatchError::NoChanges);
    }
    Ok(hunks)
}

/// 1-based line number of a body index, accounting for the begin marker.
fn line_number(body_index: usize) -> usize {
    body_index + 2
}

fn parse_path(raw: &str, body_index: usize) -> PatchResult<PathBuf> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PatchError::malformed(
            "file section marker has no path",
            line_number(body_index),
        ));
    }
    Ok(PathBuf::from(trimmed))
}

/// Consumes the `+`-prefixed body of an Add File section. Returns the
/// assembled content and the index of the first unconsumed line.
fn parse_add_body(body: &[&str], mut index: usize) -> PatchResult<(String, usize)> {
    let mut content = String::new();
    while index < body.len() {
        let line = body[index];
        if line.starts_with("*** ") {
            break;
        }
        let Some(added) = line.strip_prefix('+') else {
            return Err(PatchError::malformed(
                format!("expected '+' line in Add File body, found '{line}'"),
                line_number(index),
            ));
        };
        content.push_str(added);
        content.push('\n');
        index += 1;
    }
    Ok((content, index))
}

/// Consumes one Update File section: an optional move destination followed
/// by one or more `@@` chunks.
fn parse_update_section(
    body: &[&str],
    mut index: usize,
    path: PathBuf,
) -> PatchResult<(Hunk, usize)> {
    let mut move_to = None;
    if let Some(line) = body.get(index) {
        if let Some(dest) = line.strip_prefix(MOVE_TO) {
            move_to = Some(parse_path(dest, index)?);
            index += 1;
        }
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current: Option<Chunk> = None;
    while index < body.len() {
        let line = body[index];

        if line == END_OF_FILE {
            let mut chunk = current.take().ok_or_else(|| {
                PatchError::malformed(
                    format!("'{END_OF_FILE}' outside of a chunk"),
                    line_number(index),
                )
            })?;
            chunk.end_of_file = true;
            chunks.push(chunk);
            index += 1;
            continue;
        }
        if line.starts_with("*** ") {
            break;
        }
        if line.starts_with(CHUNK_HEADER) {
            // Anything after "@@" is an informational label; application
            // relies on the chunk's own context lines.
            if let Some(chunk) = current.take() {
                chunks.push(chunk);
            }
            current = Some(Chunk::new());
            index += 1;
            continue;
        }

        let Some(chunk) = current.as_mut() else {
            return Err(PatchError::malformed(
                format!("expected '@@' before chunk line '{line}'"),
                line_number(index),
            ));
        };
        if let Some(context) = line.strip_prefix(' ') {
            chunk.old_lines.push(context.to_string());
            chunk.new_lines.push(context.to_string());
        } else if let Some(removed) = line.strip_prefix('-') {
            chunk.old_lines.push(removed.to_string());
        } else if let Some(added) = line.strip_prefix('+') {
            chunk.new_lines.push(added.to_string());
        } else if line.is_empty() {
            // Editors strip trailing whitespace; tolerate a bare empty line
            // as empty context.
            chunk.old_lines.push(String::new());
            chunk.new_lines.push(String::new());
        } else {
            return Err(PatchError::malformed(
                format!("unrecognized chunk line '{line}'"),
                line_number(index),
            ));
        }
        index += 1;
    }
    if let Some(chunk) = current.take() {
        chunks.push(chunk);
    }

    if chunks.is_empty() {
        return Err(PatchError::malformed(
            format!("update section for {} has no chunks", path.display()),
            line_number(index),
        ));
    }
    Ok((
        Hunk::UpdateFile {
            path,
            move_to,
            chunks,
        },
        index,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parses_add_file() {
        let patch = "*** Begin Patch\n*** Add File: a.txt\n+hello\n+world\n*** End Patch";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks.len(), 1);
        match &hunks[0] {
            Hunk::AddFile { path, content } => {
                assert_eq!(path, Path::new("a.txt"));
                assert_eq!(content, "hello\nworld\n");
            }
            other => panic!("expected AddFile, got {other:?}"),
        }
    }

    #[test]
    fn parses_delete_file() {
        let patch = "*** Begin Patch\n*** Delete File: gone.txt\n*** End Patch";
        let hunks = parse_patch(patch).unwrap();
        assert!(matches!(&hunks[0], Hunk::DeleteFile { path } if path == Path::new("gone.txt")));
    }

    #[test]
    fn parses_update_with_chunk() {
        let patch = "\
*** Begin Patch
*** Update File: src/main.rs
@@ fn main()
 fn main() {
-    old();
+    new();
 }
*** End Patch";
        let hunks = parse_patch(patch).unwrap();
        match &hunks[0] {
            Hunk::UpdateFile {
                path,
                move_to,
                chunks,
            } => {
                assert_eq!(path, Path::new("src/main.rs"));
                assert!(move_to.is_none());
                assert_eq!(chunks.len(), 1);
                assert_eq!(
                    chunks[0].old_lines,
                    vec!["fn main() {", "    old();", "}"]
                );
                assert_eq!(
                    chunks[0].new_lines,
                    vec!["fn main() {", "    new();", "}"]
                );
                assert!(!chunks[0].end_of_file);
            }
            other => panic!("expected UpdateFile, got {other:?}"),
        }
    }

    #[test]
    fn parses_move_to() {
        let patch = "\
*** Begin Patch
*** Update File: old.txt
*** Move to: new.txt
@@
-before
+after
*** End Patch";
        let hunks = parse_patch(patch).unwrap();
        match &hunks[0] {
            Hunk::UpdateFile { move_to, .. } => {
                assert_eq!(move_to.as_deref(), Some(Path::new("new.txt")));
            }
            other => panic!("expected UpdateFile, got {other:?}"),
        }
    }

    #[test]
    fn parses_end_of_file_marker() {
        let patch = "\
*** Begin Patch
*** Update File: tail.txt
@@
 last line
+appended
*** End of File
*** End Patch";
        let hunks = parse_patch(patch).unwrap();
        match &hunks[0] {
            Hunk::UpdateFile { chunks, .. } => {
                assert_eq!(chunks.len(), 1);
                assert!(chunks[0].end_of_file);
            }
            other => panic!("expected UpdateFile, got {other:?}"),
        }
    }

    #[test]
    fn parses_multiple_sections_in_order() {
        let patch = "\
*** Begin Patch
*** Add File: a.txt
+content
*** Delete File: b.txt
*** Update File: c.txt
@@
-x
+y
*** End Patch";
        let hunks = parse_patch(patch).unwrap();
        assert_eq!(hunks.len(), 3);
        assert!(matches!(hunks[0], Hunk::AddFile { .. }));
        assert!(matches!(hunks[1], Hunk::DeleteFile { .. }));
        assert!(matches!(hunks[2], Hunk::UpdateFile { .. }));
    }

    #[test]
    fn missing_begin_marker_is_malformed() {
        let err = parse_patch("*** Add File: a.txt\n+x\n*** End Patch").unwrap_err();
        assert!(matches!(err, PatchError::Malformed { line: 1, .. }));
    }

    #[test]
    fn missing_end_marker_is_malformed() {
        let err = parse_patch("*** Begin Patch\n*** Add File: a.txt\n+x").unwrap_err();
        assert!(matches!(err, PatchError::Malformed { .. }));
    }

    #[test]
    fn empty_section_list_is_no_changes() {
        let err = parse_patch("*** Begin Patch\n*** End Patch").unwrap_err();
        assert!(matches!(err, PatchError::NoChanges));
    }

    #[test]
    fn stray_content_is_malformed() {
        let err =
            parse_patch("*** Begin Patch\nnot a marker\n*** End Patch").unwrap_err();
        assert!(matches!(err, PatchError::Malformed { line: 2, .. }));
    }

    #[test]
    fn chunk_line_before_chunk_header_is_malformed() {
        let patch = "*** Begin Patch\n*** Update File: a.txt\n-line\n*** End Patch";
        let err = parse_patch(patch).unwrap_err();
        assert!(matches!(err, PatchError::Malformed { .. }));
    }

    #[test]
    fn update_without_chunks_is_malformed() {
        let patch = "*** Begin Patch\n*** Update File: a.txt\n*** End Patch";
        let err = parse_patch(patch).unwrap_err();
        assert!(matches!(err, PatchError::Malformed { .. }));
    }

    #[test]
    fn tolerates_crlf_patch_text() {
        let patch = "*** Begin Patch\r\n*** Add File: a.txt\r\n+x\r\n*** End Patch\r\n";
        let hunks = parse_patch(patch).unwrap();
        assert!(matches!(&hunks[0], Hunk::AddFile { content, .. } if content == "x\n"));
    }
}
