//! Unified diff generation with change counts.

use serde::Serialize;
use similar::{ChangeTag, TextDiff};

use crate::text::normalize_line_endings;

const CONTEXT_RADIUS: usize = 3;

/// A rendered diff plus its change counts.
#[derive(Debug, Clone, Serialize)]
pub struct FileDiff {
    /// Unified-diff text, dedented to the changed region's common margin.
    pub text: String,
    /// Number of added lines.
    pub additions: usize,
    /// Number of removed lines.
    pub deletions: usize,
}

/// Produces a unified diff between two versions of one file.
///
/// Inputs are CRLF-normalized first. After rendering, the minimum common
/// leading whitespace across every hunk body line is stripped so diffs of
/// deeply indented code stay readable; relative indentation is untouched.
pub fn unified_diff(label: &str, old_content: &str, new_content: &str) -> FileDiff {
    let old_normalized = normalize_line_endings(old_content);
    let new_normalized = normalize_line_endings(new_content);
    let diff = TextDiff::from_lines(old_normalized.as_ref(), new_normalized.as_ref());

    let mut additions = 0;
    let mut deletions = 0;
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => additions += 1,
            ChangeTag::Delete => deletions += 1,
            ChangeTag::Equal => {}
        }
    }

    let mut unified = diff.unified_diff();
    unified
        .context_radius(CONTEXT_RADIUS)
        .header(&format!("a/{label}"), &format!("b/{label}"));
    let text = dedent_hunk_bodies(&unified.to_string());

    FileDiff {
        text,
        additions,
        deletions,
    }
}

/// Strips the minimum common leading whitespace from every add/remove/context
/// line body. Blank bodies are ignored when computing the minimum and come
/// out unchanged apart from the strip.
fn dedent_hunk_bodies(text: &str) -> String {
    let mut min_indent: Option<usize> = None;
    for line in text.lines() {
        let Some(body) = hunk_body(line) else {
            continue;
        };
        if body.trim().is_empty() {
            continue;
        }
        let indent = body
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        min_indent = Some(min_indent.map_or(indent, |current| current.min(indent)));
    }
    let min_indent = match min_indent {
        Some(n) if n > 0 => n,
        _ => return text.to_string(),
    };

    let mut out = Vec::new();
    for line in text.lines() {
        match hunk_body(line) {
            Some(body) => {
                let cut = body
                    .bytes()
                    .take(min_indent)
                    .take_while(|b| *b == b' ' || *b == b'\t')
                    .count();
                out.push(format!("{}{}", &line[..1], &body[cut..]));
            }
            None => out.push(line.to_string()),
        }
    }
    let mut result = out.join("\n");
    if text.ends_with('\n') {
        result.push('\n');
    }
    result
}

/// The body of a hunk line, without its marker character. Headers, hunk
/// ranges, and newline hints are not bodies.
fn hunk_body(line: &str) -> Option<&str> {
    if line.starts_with("+++")
        || line.starts_with("---")
        || line.starts_with("@@")
        || line.starts_with('\\')
    {
        return None;
    }
    if line.starts_with('+') || line.starts_with('-') || line.starts_with(' ') {
        Some(&line[1..])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts_additions_and_deletions() {
        let diff = unified_diff("demo.txt", "a\nb\nc\n", "a\nx\ny\nc\n");
        assert_eq!(diff.additions, 2);
        assert_eq!(diff.deletions, 1);
        assert!(diff.text.contains("a/demo.txt"));
        assert!(diff.text.contains("b/demo.txt"));
        assert!(diff.text.contains("-b"));
        assert!(diff.text.contains("+x"));
    }

    #[test]
    fn identical_content_produces_no_changes() {
        let diff = unified_diff("same.txt", "a\nb\n", "a\nb\n");
        assert_eq!(diff.additions, 0);
        assert_eq!(diff.deletions, 0);
    }

    #[test]
    fn normalizes_crlf_before_diffing() {
        let diff = unified_diff("f", "a\r\nb\r\n", "a\nb\n");
        assert_eq!(diff.additions, 0);
        assert_eq!(diff.deletions, 0);
    }

    #[test]
    fn dedents_deeply_indented_hunks() {
        let old = "        if deep {\n            call();\n        }\n";
        let new = "        if deep {\n            other();\n        }\n";
        let diff = unified_diff("deep.rs", old, new);
        // Eight spaces of common margin are stripped from every body.
        assert!(diff.text.contains("-    call();"));
        assert!(diff.text.contains("+    other();"));
        assert!(diff.text.contains(" if deep {"));
    }

    #[test]
    fn dedent_preserves_relative_indentation() {
        let dedented = dedent_hunk_bodies("  a\n+    b\n- c\n");
        assert_eq!(dedented, " a\n+   b\n-c\n");
    }

    #[test]
    fn dedent_ignores_blank_bodies() {
        let dedented = dedent_hunk_bodies("   \n     a\n");
        // The blank context body does not pull the minimum down to zero.
        assert_eq!(dedented, " \n a\n");
    }

    #[test]
    fn creation_diff_is_all_additions() {
        let diff = unified_diff("new.txt", "", "one\ntwo\n");
        assert_eq!(diff.additions, 2);
        assert_eq!(diff.deletions, 0);
    }
}
