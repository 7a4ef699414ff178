//! Structural parser for unified diff text.
//!
//! The parser is a small explicit state machine: a file accumulator, a hunk
//! accumulator, and two running line counters. It never fails; anything it
//! does not recognize is skipped and whatever parsed so far is kept.

use crate::parse_file_header;

/// Whether a diff line was added, removed, or unchanged context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Add,
    Remove,
    Context,
}

/// One line inside a hunk, with the `+`/`-`/space marker already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    /// Old-side line number; `None` for added lines.
    pub old_line: Option<u32>,
    /// New-side line number; `None` for removed lines.
    pub new_line: Option<u32>,
}

/// One `@@` hunk: header ranges plus the lines it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<DiffLine>,
}

/// One file entry in the diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    /// New-side path, without the `b/` prefix.
    pub path: String,
    pub hunks: Vec<DiffHunk>,
    pub is_new: bool,
    pub is_deleted: bool,
    pub is_renamed: bool,
    pub rename_from: Option<String>,
}

struct FileAcc {
    path: String,
    hunks: Vec<DiffHunk>,
    is_new: bool,
    is_deleted: bool,
    is_renamed: bool,
    rename_from: Option<String>,
}

impl FileAcc {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            hunks: Vec::new(),
            is_new: false,
            is_deleted: false,
            is_renamed: false,
            rename_from: None,
        }
    }

    fn finish(self) -> ChangedFile {
        ChangedFile {
            path: self.path,
            hunks: self.hunks,
            is_new: self.is_new,
            is_deleted: self.is_deleted,
            is_renamed: self.is_renamed,
            rename_from: self.rename_from,
        }
    }
}

struct HunkAcc {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
    /// Next old-side line number to assign.
    old_line: u32,
    /// Next new-side line number to assign.
    new_line: u32,
    lines: Vec<DiffLine>,
}

impl HunkAcc {
    fn open(header: HunkHeader) -> Self {
        Self {
            old_start: header.old_start,
            old_count: header.old_count,
            new_start: header.new_start,
            new_count: header.new_count,
            old_line: header.old_start,
            new_line: header.new_start,
            lines: Vec::new(),
        }
    }

    fn push_add(&mut self, content: &str) {
        self.lines.push(DiffLine {
            kind: LineKind::Add,
            content: content.to_string(),
            old_line: None,
            new_line: Some(self.new_line),
        });
        self.new_line = self.new_line.saturating_add(1);
    }

    fn push_remove(&mut self, content: &str) {
        self.lines.push(DiffLine {
            kind: LineKind::Remove,
            content: content.to_string(),
            old_line: Some(self.old_line),
            new_line: None,
        });
        self.old_line = self.old_line.saturating_add(1);
    }

    fn push_context(&mut self, content: &str) {
        self.lines.push(DiffLine {
            kind: LineKind::Context,
            content: content.to_string(),
            old_line: Some(self.old_line),
            new_line: Some(self.new_line),
        });
        self.old_line = self.old_line.saturating_add(1);
        self.new_line = self.new_line.saturating_add(1);
    }

    fn finish(self) -> DiffHunk {
        DiffHunk {
            old_start: self.old_start,
            old_count: self.old_count,
            new_start: self.new_start,
            new_count: self.new_count,
            lines: self.lines,
        }
    }
}

struct HunkHeader {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
}

/// Parse `@@ -O[,o] +N[,n] @@ ...`; omitted counts default to 1.
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let rest = line.strip_prefix("@@ -")?;
    let (old, rest) = rest.split_once(" +")?;
    let (new, _) = rest.split_once(" @@")?;
    let (old_start, old_count) = parse_range(old)?;
    let (new_start, new_count) = parse_range(new)?;
    Some(HunkHeader {
        old_start,
        old_count,
        new_start,
        new_count,
    })
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

fn flush_hunk(file: &mut Option<FileAcc>, hunk: &mut Option<HunkAcc>) {
    if let (Some(file), Some(hunk)) = (file.as_mut(), hunk.take()) {
        file.hunks.push(hunk.finish());
    }
}

fn flush_file(files: &mut Vec<ChangedFile>, file: &mut Option<FileAcc>) {
    if let Some(file) = file.take() {
        files.push(file.finish());
    }
}

/// Returns true when `line` is file-level metadata that was consumed.
fn apply_metadata(file: &mut FileAcc, line: &str) -> bool {
    if line.starts_with("new file") {
        file.is_new = true;
    } else if line.starts_with("deleted file") {
        file.is_deleted = true;
    } else if line.starts_with("similarity index") {
        file.is_renamed = true;
    } else if let Some(from) = line.strip_prefix("rename from ") {
        if from.is_empty() {
            return false;
        }
        file.is_renamed = true;
        file.rename_from = Some(from.to_string());
    } else if line.starts_with("rename to ")
        || line.starts_with("index ")
        || line.starts_with("---")
        || line.starts_with("+++")
        || line.starts_with("Binary files")
    {
        // Recognized but carries nothing we record.
    } else {
        return false;
    }
    true
}

/// Parse unified diff text into per-file structure.
///
/// Total: returns an empty vec for blank input and a partial result for
/// malformed input. Line numbers are assigned from the hunk header ranges,
/// old-side and new-side counted independently.
pub fn parse_diff(diff_text: &str) -> Vec<ChangedFile> {
    if diff_text.trim().is_empty() {
        return Vec::new();
    }

    let mut files: Vec<ChangedFile> = Vec::new();
    let mut file: Option<FileAcc> = None;
    let mut hunk: Option<HunkAcc> = None;

    let lines: Vec<&str> = diff_text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];

        if let Some(path) = parse_file_header(line) {
            flush_hunk(&mut file, &mut hunk);
            flush_file(&mut files, &mut file);
            file = Some(FileAcc::new(path));
            i += 1;
            continue;
        }

        // File metadata only appears between the header and the first hunk,
        // or between hunks after an early hunk termination.
        if hunk.is_none() {
            if let Some(current) = file.as_mut() {
                if apply_metadata(current, line) {
                    i += 1;
                    continue;
                }
            }
        }

        if let Some(header) = parse_hunk_header(line) {
            flush_hunk(&mut file, &mut hunk);
            hunk = Some(HunkAcc::open(header));
            i += 1;
            continue;
        }

        if let Some(open) = hunk.as_mut() {
            match line.as_bytes().first() {
                Some(b'+') => open.push_add(&line[1..]),
                Some(b'-') => open.push_remove(&line[1..]),
                Some(b' ') => open.push_context(&line[1..]),
                // "\ No newline at end of file"
                Some(b'\\') => {}
                _ => {
                    // Unexpected content ends the hunk; reprocess the line
                    // as top-level.
                    flush_hunk(&mut file, &mut hunk);
                    continue;
                }
            }
        }
        i += 1;
    }

    flush_hunk(&mut file, &mut hunk);
    flush_file(&mut files, &mut file);
    files
}
