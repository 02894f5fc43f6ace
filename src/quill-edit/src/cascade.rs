//! Fixed-precedence resolution of a fragment against file content.
//!
//! Discovery and uniqueness are two separate stages: each strategy only
//! produces candidates; this module walks the strategies in precedence order
//! and enforces that the winning strategy's candidate is unambiguous before
//! any substitution happens.

use tracing::debug;

use crate::error::EditError;
use crate::strategies::{
    BlockAnchor, Exact, IndentationFlexible, LineTrimmed, MatchStrategy, MultiOccurrence,
    WhitespaceNormalized,
};
use crate::text::{leading_whitespace, strip_common_indentation, truncate_with_ellipsis};

/// Precedence order. The first strategy producing a candidate wins; later
/// strategies are never consulted.
static CASCADE: [&dyn MatchStrategy; 5] = [
    &Exact,
    &LineTrimmed,
    &WhitespaceNormalized,
    &IndentationFlexible,
    &BlockAnchor,
];

const SEARCH_PREVIEW_LEN: usize = 100;

/// A fragment resolved to one literal region of content.
#[derive(Debug, Clone)]
pub struct ResolvedMatch {
    /// The literal substring of content that will be replaced.
    pub text: String,
    /// Name of the strategy that discovered it.
    pub strategy: &'static str,
}

/// Outcome of applying a substitution to in-memory content.
#[derive(Debug, Clone)]
pub struct Substitution {
    /// Content after the substitution.
    pub content: String,
    /// Name of the strategy that resolved the fragment.
    pub strategy: &'static str,
    /// How many occurrences were replaced.
    pub occurrences: usize,
}

/// Resolves `old` to exactly one literal region of `content`.
///
/// Walks the cascade in order; the first strategy with any candidate wins.
/// That strategy must produce exactly one distinct candidate, and the
/// candidate must occur exactly once verbatim in the content.
pub fn resolve(content: &str, old: &str) -> Result<ResolvedMatch, EditError> {
    let mut tried = Vec::with_capacity(CASCADE.len());
    for strategy in CASCADE {
        tried.push(strategy.name());
        let mut candidates = strategy.find(content, old);
        if candidates.is_empty() {
            continue;
        }
        debug!(
            "strategy '{}' produced {} candidate(s)",
            strategy.name(),
            candidates.len()
        );
        if candidates.len() > 1 {
            return Err(EditError::AmbiguousMatch {
                search: truncate_with_ellipsis(old, SEARCH_PREVIEW_LEN).into_owned(),
                count: candidates.len(),
                strategy: strategy.name(),
            });
        }
        let text = candidates.remove(0);
        let occurrences = content.matches(text.as_str()).count();
        if occurrences != 1 {
            return Err(EditError::AmbiguousMatch {
                search: truncate_with_ellipsis(old, SEARCH_PREVIEW_LEN).into_owned(),
                count: occurrences,
                strategy: strategy.name(),
            });
        }
        return Ok(ResolvedMatch {
            text,
            strategy: strategy.name(),
        });
    }
    Err(EditError::NoMatch {
        search: truncate_with_ellipsis(old, SEARCH_PREVIEW_LEN).into_owned(),
        strategies_tried: tried,
    })
}

/// Resolves `old` for replace-all mode.
///
/// The first candidate discovered by the cascade is taken verbatim and every
/// occurrence of it counts; uniqueness is not required.
pub fn resolve_all(content: &str, old: &str) -> Result<(ResolvedMatch, usize), EditError> {
    let mut tried = Vec::with_capacity(CASCADE.len());
    for strategy in CASCADE {
        tried.push(strategy.name());
        let mut candidates = strategy.find(content, old);
        if candidates.is_empty() {
            continue;
        }
        let text = candidates.remove(0);
        let occurrences = MultiOccurrence.find(content, &text).len();
        debug!(
            "strategy '{}' resolved replace-all fragment, {} occurrence(s)",
            strategy.name(),
            occurrences
        );
        return Ok((
            ResolvedMatch {
                text,
                strategy: strategy.name(),
            },
            occurrences,
        ));
    }
    Err(EditError::NoMatch {
        search: truncate_with_ellipsis(old, SEARCH_PREVIEW_LEN).into_owned(),
        strategies_tried: tried,
    })
}

/// The core substitution routine shared by the single- and multi-edit
/// orchestrators. Pure with respect to the filesystem.
pub fn substitute(
    content: &str,
    old: &str,
    new: &str,
    replace_all: bool,
) -> Result<Substitution, EditError> {
    if replace_all {
        let (matched, occurrences) = resolve_all(content, old)?;
        let replacement = reindent_for_window(new, old, &matched.text, matched.strategy);
        Ok(Substitution {
            content: content.replace(matched.text.as_str(), &replacement),
            strategy: matched.strategy,
            occurrences,
        })
    } else {
        let matched = resolve(content, old)?;
        let replacement = reindent_for_window(new, old, &matched.text, matched.strategy);
        Ok(Substitution {
            content: content.replacen(matched.text.as_str(), &replacement, 1),
            strategy: matched.strategy,
            occurrences: 1,
        })
    }
}

/// When a line-based strategy matched a window whose indentation differs
/// from the fragment's, shift the replacement to the window's indentation so
/// the surrounding block keeps its shape. Exact matches take the replacement
/// verbatim.
fn reindent_for_window(new: &str, old: &str, window: &str, strategy: &'static str) -> String {
    if strategy == "exact" {
        return new.to_string();
    }
    let window_indent = leading_whitespace(window.lines().next().unwrap_or(""));
    let old_indent = leading_whitespace(old.lines().next().unwrap_or(""));
    if window_indent == old_indent {
        return new.to_string();
    }
    strip_common_indentation(new)
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{window_indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
