//! Quill Apply Patch - multi-file patch application.
//!
//! Parses an agent-friendly patch format and executes its file operations
//! beneath a base directory. The format wraps operations between
//! `*** Begin Patch` and `*** End Patch`; each operation starts with
//! `*** Add File:`, `*** Delete File:`, or `*** Update File:` (optionally
//! followed by `*** Move to:`), and update bodies use `@@` chunks with
//! ` `/`-`/`+` prefixed lines.
//!
//! Application is staged: every operation is validated against an in-memory
//! view of the tree, and writes happen only once the whole patch has
//! resolved. A failure anywhere leaves the filesystem untouched.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let patch = "\
//! *** Begin Patch
//! *** Update File: src/main.rs
//! @@
//! -    old();
//! +    new();
//! *** End Patch";
//!
//! let outcome = quill_apply_patch::apply_patch(patch, Path::new("."))?;
//! println!("{}", outcome.summary);
//! # Ok::<(), quill_apply_patch::PatchError>(())
//! ```

mod applier;
mod error;
mod hunk;
mod parser;

pub use applier::{ChangeKind, FileChangeRecord, PatchOutcome, apply_hunks};
pub use error::{PatchError, PatchResult};
pub use hunk::{Chunk, Hunk};
pub use parser::{BEGIN_PATCH, END_PATCH, parse_patch};

use std::path::Path;

/// Parses `patch_text` and applies it beneath `base_dir`.
pub fn apply_patch(patch_text: &str, base_dir: &Path) -> PatchResult<PatchOutcome> {
    let hunks = parse_patch(patch_text)?;
    apply_hunks(&hunks, base_dir)
}
