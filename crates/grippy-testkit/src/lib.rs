//! Test helpers for grippy.
//!
//! The main export is [`DiffBuilder`], a small fluent builder for
//! well-formed unified diff strings:
//!
//! ```rust
//! use grippy_testkit::DiffBuilder;
//!
//! let diff = DiffBuilder::new()
//!     .file("src/app.py")
//!         .hunk(1, 1, 1, 2)
//!             .context("def main():")
//!             .add("    run()")
//!             .done()
//!         .done()
//!     .build();
//!
//! assert!(diff.contains("+    run()"));
//! ```

mod diff_builder;

pub use diff_builder::{DiffBuilder, FileBuilder, HunkBuilder, HunkInProgress};
