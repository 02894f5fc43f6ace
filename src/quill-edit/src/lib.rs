//! Quill Edit - precise fragment substitution for agent-driven file edits.
//!
//! Given a file's content and a caller-supplied before/after fragment pair,
//! this crate locates the fragment with confidence and applies the
//! substitution, refusing to act when the match is ambiguous. Matching runs
//! through a fixed-precedence cascade of equivalence strategies, from exact
//! through increasingly permissive whitespace rules; whichever strategy
//! resolves, the replaced region is always a literal substring of the file.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let outcome = quill_edit::edit(
//!     Path::new("src/main.rs"),
//!     "println!(\"hello\");",
//!     "println!(\"goodbye\");",
//!     false,
//! )?;
//! println!("{} (+{} -{})", outcome.title, outcome.additions, outcome.deletions);
//! # Ok::<(), quill_edit::EditError>(())
//! ```

mod cascade;
mod diff;
mod edit;
mod error;
mod multi_edit;
mod strategies;
mod text;

pub use cascade::{ResolvedMatch, Substitution, resolve, resolve_all, substitute};
pub use diff::{FileDiff, unified_diff};
pub use edit::{EditOutcome, edit};
pub use error::{EditError, EditResult};
pub use multi_edit::{EditOperation, EditReport, MultiEditOutcome, multi_edit};
pub use text::{
    detect_line_ending, normalize_line_endings, restore_line_endings, truncate_with_ellipsis,
};
