//! Text helpers shared by matching, diffing, and the orchestrators.

use std::borrow::Cow;

/// Detects the dominant line ending of `content` from its first newline.
pub fn detect_line_ending(content: &str) -> &'static str {
    match content.find('\n') {
        Some(idx) if idx > 0 && content.as_bytes()[idx - 1] == b'\r' => "\r\n",
        _ => "\n",
    }
}

/// Normalizes CRLF line endings to LF. Matching always runs on LF content.
pub fn normalize_line_endings(content: &str) -> Cow<'_, str> {
    if content.contains("\r\n") {
        Cow::Owned(content.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(content)
    }
}

/// Restores the detected line ending on content that was normalized to LF.
pub fn restore_line_endings(content: &str, ending: &str) -> String {
    if ending == "\r\n" {
        content.replace('\n', "\r\n")
    } else {
        content.to_string()
    }
}

/// Byte spans of each line in `content`, excluding the terminator.
/// Mirrors the line iteration of `str::lines` on LF-normalized input.
pub(crate) fn line_spans(content: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (idx, byte) in content.bytes().enumerate() {
        if byte == b'\n' {
            spans.push((start, idx));
            start = idx + 1;
        }
    }
    if start < content.len() {
        spans.push((start, content.len()));
    }
    spans
}

/// The literal slice of `content` covering `count` lines starting at line
/// `start`, without the trailing terminator.
pub(crate) fn window_slice<'a>(
    content: &'a str,
    spans: &[(usize, usize)],
    start: usize,
    count: usize,
) -> &'a str {
    let first = spans[start];
    let last = spans[start + count - 1];
    &content[first.0..last.1]
}

/// The leading whitespace of a line.
pub(crate) fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

/// Byte length of a line's leading indentation (spaces and tabs only).
pub(crate) fn indent_len(line: &str) -> usize {
    line.bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

/// Collapses every whitespace run to a single space.
pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips the minimum common leading indentation from every non-blank line.
/// Blank lines come out empty.
pub(crate) fn strip_common_indentation(s: &str) -> String {
    let lines: Vec<&str> = s.lines().collect();
    let min_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| indent_len(l))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                &line[min_indent..]
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncates a string to a maximum character count, adding ellipsis.
pub fn truncate_with_ellipsis(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        Cow::Borrowed(s)
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        Cow::Owned(format!("{truncated}..."))
    }
}
