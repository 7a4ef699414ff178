//! Comment addressability index.
//!
//! GitHub review comments can only anchor to lines that exist on the new
//! side of the diff. This pass computes exactly that set, independently of
//! the structural parser: a single forward scan tracking one right-side
//! counter.

use std::collections::{BTreeMap, BTreeSet};

use crate::parse_file_header;

/// New-side start of an `@@` hunk header, if `line` is one.
fn hunk_new_start(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("@@ -")?;
    let (_, rest) = rest.split_once(" +")?;
    let (new_range, _) = rest.split_once(" @@")?;
    let start = new_range.split(',').next().unwrap_or(new_range);
    start.parse().ok()
}

/// Map each changed file to the new-side line numbers a comment can attach
/// to (added and context lines; removed lines are left-side only).
///
/// Every file named by a `diff --git` header gets an entry, so files with
/// no addressable lines (binary, delete-only) map to an empty set.
pub fn parse_diff_lines(diff_text: &str) -> BTreeMap<String, BTreeSet<u32>> {
    if diff_text.trim().is_empty() {
        return BTreeMap::new();
    }

    let mut index: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut right_line: u32 = 0;

    for line in diff_text.lines() {
        if let Some(path) = parse_file_header(line) {
            index.entry(path.to_string()).or_default();
            current = Some(path.to_string());
            continue;
        }
        if let Some(start) = hunk_new_start(line) {
            right_line = start;
            continue;
        }
        let Some(path) = current.as_deref() else {
            continue;
        };
        if line.starts_with("---")
            || line.starts_with("+++")
            || line.starts_with("new file")
            || line.starts_with("index ")
        {
            continue;
        }
        match line.as_bytes().first() {
            Some(b'-') => {}
            Some(b'+') | Some(b' ') => {
                if let Some(lines) = index.get_mut(path) {
                    lines.insert(right_line);
                }
                right_line = right_line.saturating_add(1);
            }
            _ => {}
        }
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn empty_diff_yields_empty_index() {
        assert!(parse_diff_lines("").is_empty());
        assert!(parse_diff_lines("  \n ").is_empty());
    }

    #[test]
    fn added_and_context_lines_are_addressable() {
        let diff = "\
diff --git a/src/app.py b/src/app.py
index 1111111..2222222 100644
--- a/src/app.py
+++ b/src/app.py
@@ -1,3 +1,4 @@
 def main():
+    print(\"hello\")
     run()
-    stop()
";
        let index = parse_diff_lines(diff);
        assert_eq!(index.len(), 1);
        assert_eq!(index["src/app.py"], set(&[1, 2, 3]));
    }

    #[test]
    fn removed_lines_do_not_advance_the_right_side() {
        let diff = "\
diff --git a/f b/f
@@ -10,3 +20,2 @@
 keep
-drop
-drop2
+new
";
        let index = parse_diff_lines(diff);
        assert_eq!(index["f"], set(&[20, 21]));
    }

    #[test]
    fn multiple_hunks_reset_the_counter() {
        let diff = "\
diff --git a/f b/f
@@ -1,1 +1,1 @@
+one
@@ -50,2 +60,2 @@
 ctx
+two
";
        let index = parse_diff_lines(diff);
        assert_eq!(index["f"], set(&[1, 60, 61]));
    }

    #[test]
    fn header_only_file_gets_empty_entry() {
        let diff = "\
diff --git a/logo.png b/logo.png
Binary files a/logo.png and b/logo.png differ
";
        let index = parse_diff_lines(diff);
        assert_eq!(index["logo.png"], BTreeSet::new());
    }

    #[test]
    fn deleted_file_has_no_addressable_lines() {
        let diff = "\
diff --git a/gone.py b/gone.py
deleted file mode 100644
--- a/gone.py
+++ /dev/null
@@ -1,2 +0,0 @@
-x = 1
-y = 2
";
        let index = parse_diff_lines(diff);
        assert_eq!(index["gone.py"], BTreeSet::new());
    }

    #[test]
    fn files_are_tracked_independently() {
        let diff = "\
diff --git a/a.py b/a.py
@@ -1,1 +5,1 @@
+alpha
diff --git a/b.py b/b.py
@@ -1,1 +9,1 @@
+beta
";
        let index = parse_diff_lines(diff);
        assert_eq!(index["a.py"], set(&[5]));
        assert_eq!(index["b.py"], set(&[9]));
    }
}
