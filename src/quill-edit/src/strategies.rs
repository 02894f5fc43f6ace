//! Candidate discovery strategies for fragment matching.
//!
//! Each strategy inspects the content under one equivalence rule and returns
//! the literal substrings it judges equivalent to the fragment. Strategies
//! never replace anything and never decide uniqueness; both belong to the
//! cascade.

use crate::text::{collapse_whitespace, line_spans, strip_common_indentation, window_slice};

/// A candidate-producing match rule.
///
/// `find` returns distinct literal substrings of `content` equivalent to
/// `old` under this strategy's rule, in discovery order.
pub(crate) trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn find(&self, content: &str, old: &str) -> Vec<String>;
}

fn push_unique(candidates: &mut Vec<String>, candidate: &str) {
    if !candidates.iter().any(|c| c == candidate) {
        candidates.push(candidate.to_string());
    }
}

// =============================================================================
// Strategy 1: Exact — the fragment appears verbatim
// =============================================================================

pub(crate) struct Exact;

impl MatchStrategy for Exact {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn find(&self, content: &str, old: &str) -> Vec<String> {
        if !old.is_empty() && content.contains(old) {
            vec![old.to_string()]
        } else {
            Vec::new()
        }
    }
}

// =============================================================================
// Strategy 2: Line-trimmed — per-line comparison ignoring edge whitespace
// =============================================================================

/// Matches a window of consecutive lines where each line equals the
/// fragment's corresponding line after trimming. The candidate is the
/// untrimmed original slice.
pub(crate) struct LineTrimmed;

impl MatchStrategy for LineTrimmed {
    fn name(&self) -> &'static str {
        "line-trimmed"
    }

    fn find(&self, content: &str, old: &str) -> Vec<String> {
        let spans = line_spans(content);
        let old_lines: Vec<&str> = old.lines().collect();
        if old_lines.is_empty() || spans.len() < old_lines.len() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for start in 0..=spans.len() - old_lines.len() {
            let matches = old_lines.iter().enumerate().all(|(offset, old_line)| {
                let (lo, hi) = spans[start + offset];
                content[lo..hi].trim() == old_line.trim()
            });
            if matches {
                push_unique(
                    &mut candidates,
                    window_slice(content, &spans, start, old_lines.len()),
                );
            }
        }
        candidates
    }
}

// =============================================================================
// Strategy 3: Whitespace-normalized — collapse interior whitespace runs
// =============================================================================

pub(crate) struct WhitespaceNormalized;

impl MatchStrategy for WhitespaceNormalized {
    fn name(&self) -> &'static str {
        "whitespace-normalized"
    }

    fn find(&self, content: &str, old: &str) -> Vec<String> {
        let spans = line_spans(content);
        let line_count = old.lines().count();
        if line_count == 0 || spans.len() < line_count {
            return Vec::new();
        }
        let old_normalized = collapse_whitespace(old);
        if old_normalized.is_empty() {
            return Vec::new();
        }

        let mut candidates = Vec::new();
        for start in 0..=spans.len() - line_count {
            let window = window_slice(content, &spans, start, line_count);
            if collapse_whitespace(window) == old_normalized {
                push_unique(&mut candidates, window);
            }
        }
        candidates
    }
}

// =============================================================================
// Strategy 4: Indentation-flexible — ignore a uniform indentation shift
// =============================================================================

/// Compares windows after stripping the minimum common leading indentation
/// from both sides. Relative indentation inside the window still has to
/// match; only a uniform shift is forgiven.
pub(crate) struct IndentationFlexible;

impl MatchStrategy for IndentationFlexible {
    fn name(&self) -> &'static str {
        "indentation-flexible"
    }

    fn find(&self, content: &str, old: &str) -> Vec<String> {
        let spans = line_spans(content);
        let line_count = old.lines().count();
        if line_count == 0 || spans.len() < line_count {
            return Vec::new();
        }
        let old_normalized = strip_common_indentation(old);

        let mut candidates = Vec::new();
        for start in 0..=spans.len() - line_count {
            let window = window_slice(content, &spans, start, line_count);
            if strip_common_indentation(window) == old_normalized {
                push_unique(&mut candidates, window);
            }
        }
        candidates
    }
}

// =============================================================================
// Strategy 5: Block-anchor — first and last lines only, interior unchecked
// =============================================================================

/// Last resort for fragments of at least three lines: a window matches if its
/// trimmed first and last lines equal the fragment's. The interior is
/// intentionally not compared; the cascade's uniqueness stage rejects the
/// strategy whenever more than one window qualifies.
pub(crate) struct BlockAnchor;

impl MatchStrategy for BlockAnchor {
    fn name(&self) -> &'static str {
        "block-anchor"
    }

    fn find(&self, content: &str, old: &str) -> Vec<String> {
        let old_lines: Vec<&str> = old.lines().collect();
        if old_lines.len() < 3 {
            return Vec::new();
        }
        let spans = line_spans(content);
        if spans.len() < old_lines.len() {
            return Vec::new();
        }
        let first = old_lines[0].trim();
        let last = old_lines[old_lines.len() - 1].trim();

        let mut candidates = Vec::new();
        for start in 0..=spans.len() - old_lines.len() {
            let (first_lo, first_hi) = spans[start];
            let (last_lo, last_hi) = spans[start + old_lines.len() - 1];
            if content[first_lo..first_hi].trim() == first
                && content[last_lo..last_hi].trim() == last
            {
                push_unique(
                    &mut candidates,
                    window_slice(content, &spans, start, old_lines.len()),
                );
            }
        }
        candidates
    }
}

// =============================================================================
// Strategy 6: Multi-occurrence — every verbatim occurrence, for replace-all
// =============================================================================

pub(crate) struct MultiOccurrence;

impl MatchStrategy for MultiOccurrence {
    fn name(&self) -> &'static str {
        "multi-occurrence"
    }

    /// Unlike the other strategies this returns one entry per occurrence,
    /// duplicates included; the cascade uses the length as the occurrence
    /// count.
    fn find(&self, content: &str, old: &str) -> Vec<String> {
        if old.is_empty() {
            return Vec::new();
        }
        content
            .match_indices(old)
            .map(|(_, matched)| matched.to_string())
            .collect()
    }
}
