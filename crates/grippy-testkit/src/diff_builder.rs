//! Fluent builder for unified diff strings used across the test suites.

/// Top-level builder. Collects files and joins them into one diff.
#[derive(Debug, Clone, Default)]
pub struct DiffBuilder {
    files: Vec<FileSpec>,
}

impl DiffBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a file entry; finish it with [`FileBuilder::done`].
    pub fn file(self, path: &str) -> FileBuilder {
        FileBuilder {
            diff: self,
            spec: FileSpec::new(path),
        }
    }

    pub fn build(self) -> String {
        let mut out = String::new();
        for file in &self.files {
            file.render(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone)]
struct FileSpec {
    path: String,
    old_path: Option<String>,
    hunks: Vec<HunkBuilder>,
    is_new: bool,
    is_deleted: bool,
    is_binary: bool,
}

impl FileSpec {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            old_path: None,
            hunks: Vec::new(),
            is_new: false,
            is_deleted: false,
            is_binary: false,
        }
    }

    fn render(&self, out: &mut String) {
        let a_path = self.old_path.as_deref().unwrap_or(&self.path);
        out.push_str(&format!("diff --git a/{} b/{}\n", a_path, self.path));

        if self.is_new {
            out.push_str("new file mode 100644\n");
        }
        if self.is_deleted {
            out.push_str("deleted file mode 100644\n");
        }
        if self.old_path.is_some() {
            out.push_str("similarity index 90%\n");
            out.push_str(&format!("rename from {}\n", a_path));
            out.push_str(&format!("rename to {}\n", self.path));
        }
        out.push_str("index 1111111..2222222 100644\n");

        if self.is_binary {
            out.push_str(&format!(
                "Binary files a/{} and b/{} differ\n",
                a_path, self.path
            ));
            return;
        }

        if self.is_new {
            out.push_str("--- /dev/null\n");
        } else {
            out.push_str(&format!("--- a/{}\n", a_path));
        }
        if self.is_deleted {
            out.push_str("+++ /dev/null\n");
        } else {
            out.push_str(&format!("+++ b/{}\n", self.path));
        }

        for hunk in &self.hunks {
            hunk.render(out);
        }
    }
}

/// Builds one file entry inside a [`DiffBuilder`] chain.
#[derive(Debug)]
pub struct FileBuilder {
    diff: DiffBuilder,
    spec: FileSpec,
}

impl FileBuilder {
    pub fn new_file(mut self) -> Self {
        self.spec.is_new = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.spec.is_deleted = true;
        self
    }

    pub fn binary(mut self) -> Self {
        self.spec.is_binary = true;
        self
    }

    pub fn renamed_from(mut self, old_path: &str) -> Self {
        self.spec.old_path = Some(old_path.to_string());
        self
    }

    /// Start a hunk; finish it with [`HunkInProgress::done`].
    pub fn hunk(self, old_start: u32, old_count: u32, new_start: u32, new_count: u32) -> HunkInProgress {
        HunkInProgress {
            file: self,
            hunk: HunkBuilder::new(old_start, old_count, new_start, new_count),
        }
    }

    /// Finish this file and return to the diff builder.
    pub fn done(mut self) -> DiffBuilder {
        self.diff.files.push(self.spec);
        self.diff
    }
}

/// Builds one hunk inside a [`FileBuilder`] chain.
#[derive(Debug)]
pub struct HunkInProgress {
    file: FileBuilder,
    hunk: HunkBuilder,
}

impl HunkInProgress {
    pub fn context(mut self, content: &str) -> Self {
        self.hunk = self.hunk.context(content);
        self
    }

    pub fn add(mut self, content: &str) -> Self {
        self.hunk = self.hunk.add(content);
        self
    }

    pub fn remove(mut self, content: &str) -> Self {
        self.hunk = self.hunk.remove(content);
        self
    }

    pub fn add_all(mut self, lines: &[&str]) -> Self {
        for line in lines {
            self = self.add(line);
        }
        self
    }

    /// Finish this hunk and return to the file builder.
    pub fn done(mut self) -> FileBuilder {
        self.file.spec.hunks.push(self.hunk);
        self.file
    }
}

/// Standalone hunk builder, usable outside the fluent chain.
#[derive(Debug, Clone)]
pub struct HunkBuilder {
    old_start: u32,
    old_count: u32,
    new_start: u32,
    new_count: u32,
    lines: Vec<(char, String)>,
}

impl HunkBuilder {
    pub fn new(old_start: u32, old_count: u32, new_start: u32, new_count: u32) -> Self {
        Self {
            old_start,
            old_count,
            new_start,
            new_count,
            lines: Vec::new(),
        }
    }

    pub fn context(mut self, content: &str) -> Self {
        self.lines.push((' ', content.to_string()));
        self
    }

    pub fn add(mut self, content: &str) -> Self {
        self.lines.push(('+', content.to_string()));
        self
    }

    pub fn remove(mut self, content: &str) -> Self {
        self.lines.push(('-', content.to_string()));
        self
    }

    fn render(&self, out: &mut String) {
        out.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            self.old_start, self.old_count, self.new_start, self.new_count
        ));
        for (marker, content) in &self.lines {
            out.push(*marker);
            out.push_str(content);
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_single_file_addition() {
        let diff = DiffBuilder::new()
            .file("src/app.py")
            .hunk(1, 1, 1, 2)
            .context("def main():")
            .add("    run()")
            .done()
            .done()
            .build();

        assert!(diff.contains("diff --git a/src/app.py b/src/app.py"));
        assert!(diff.contains("@@ -1,1 +1,2 @@"));
        assert!(diff.contains(" def main():"));
        assert!(diff.contains("+    run()"));
    }

    #[test]
    fn builds_new_deleted_and_binary_entries() {
        let diff = DiffBuilder::new()
            .file("fresh.py")
            .new_file()
            .hunk(0, 0, 1, 1)
            .add("x = 1")
            .done()
            .done()
            .file("gone.py")
            .deleted()
            .hunk(1, 1, 0, 0)
            .remove("x = 1")
            .done()
            .done()
            .file("logo.png")
            .binary()
            .done()
            .build();

        assert!(diff.contains("new file mode 100644"));
        assert!(diff.contains("+++ /dev/null"));
        assert!(diff.contains("Binary files a/logo.png and b/logo.png differ"));
    }

    #[test]
    fn builds_rename_entry() {
        let diff = DiffBuilder::new()
            .file("new_name.py")
            .renamed_from("old_name.py")
            .done()
            .build();

        assert!(diff.contains("rename from old_name.py"));
        assert!(diff.contains("rename to new_name.py"));
    }

    #[test]
    fn add_all_appends_in_order() {
        let diff = DiffBuilder::new()
            .file("f")
            .hunk(0, 0, 1, 2)
            .add_all(&["first", "second"])
            .done()
            .done()
            .build();

        let first = diff.find("+first").unwrap();
        let second = diff.find("+second").unwrap();
        assert!(first < second);
    }
}
