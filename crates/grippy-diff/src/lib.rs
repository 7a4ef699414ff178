//! Unified diff parsing for grippy.
//!
//! Two independent passes over the same diff text:
//!
//! * [`parse_diff`] builds the full file/hunk/line structure rules run over.
//! * [`parse_diff_lines`] computes the much smaller addressability index:
//!   which new-side line numbers a review comment can anchor to.
//!
//! Both are total functions. Malformed input degrades to a partial result,
//! never an error.

mod index;
mod unified;

pub use index::parse_diff_lines;
pub use unified::{parse_diff, ChangedFile, DiffHunk, DiffLine, LineKind};

/// Extract the new-side path from a `diff --git a/<old> b/<new>` header.
///
/// Mirrors the greedy capture both passes rely on: the path is everything
/// after the *last* ` b/` separator, so paths containing ` b/` still parse.
pub(crate) fn parse_file_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("diff --git a/")?;
    let sep = rest.rfind(" b/")?;
    if sep == 0 {
        return None;
    }
    let path = &rest[sep + 3..];
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}
