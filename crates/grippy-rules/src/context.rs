//! Evaluation context shared by all rules.

use globset::Glob;
use grippy_diff::{ChangedFile, LineKind};
use grippy_types::ProfileConfig;

/// One added line surfaced to rules, with its new-side number and the
/// file it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddedLine<'a> {
    pub file: &'a str,
    pub line: u32,
    pub content: &'a str,
}

/// Everything a rule may look at for one review run.
#[derive(Debug, Clone)]
pub struct RuleContext {
    /// Raw diff text, for rules that need more than the parsed structure.
    pub diff: String,
    pub files: Vec<ChangedFile>,
    pub profile: ProfileConfig,
}

impl RuleContext {
    pub fn new(diff: impl Into<String>, files: Vec<ChangedFile>, profile: ProfileConfig) -> Self {
        Self {
            diff: diff.into(),
            files,
            profile,
        }
    }

    pub fn files_changed(&self) -> Vec<&str> {
        self.files.iter().map(|f| f.path.as_str()).collect()
    }

    /// Added lines of every file whose path matches `path_glob`, in file
    /// then hunk order.
    ///
    /// The glob uses fnmatch-style semantics: `*` crosses `/`, so
    /// `*.py` matches files at any depth. An invalid glob matches
    /// nothing.
    pub fn added_lines_for(&self, path_glob: &str) -> Vec<AddedLine<'_>> {
        let Ok(glob) = Glob::new(path_glob) else {
            return Vec::new();
        };
        let matcher = glob.compile_matcher();

        let mut out = Vec::new();
        for file in &self.files {
            if !matcher.is_match(&file.path) {
                continue;
            }
            out.extend(added_lines(file).map(|(line, content)| AddedLine {
                file: &file.path,
                line,
                content,
            }));
        }
        out
    }
}

/// Added lines of a single file as `(new_line, content)`, in hunk order.
pub fn added_lines(file: &ChangedFile) -> impl Iterator<Item = (u32, &str)> {
    file.hunks
        .iter()
        .flat_map(|h| h.lines.iter())
        .filter(|l| l.kind == LineKind::Add)
        .filter_map(|l| l.new_line.map(|n| (n, l.content.as_str())))
}
