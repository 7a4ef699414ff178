//! Rule 1: `workflow-permissions-expanded`.
//!
//! Block-aware scanning of GitHub Actions workflow files for expanded
//! permissions, `pull_request_target` triggers, and unpinned actions.

use std::sync::LazyLock;

use grippy_diff::{ChangedFile, DiffHunk, DiffLine, LineKind};
use grippy_types::{RuleResult, Severity};
use regex::Regex;

use crate::context::RuleContext;
use crate::engine::Rule;

const WORKFLOW_PREFIX: &str = ".github/workflows/";
const WORKFLOW_EXTENSIONS: [&str; 2] = [".yml", ".yaml"];

/// A match only counts when an added line sits within this many collected
/// lines of it. Keeps pre-existing workflow content from re-triggering on
/// unrelated edits.
const ADDED_PROXIMITY: usize = 2;

static SHA_PIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@[0-9a-f]{40}\b").expect("valid regex"));
static USES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-?\s*uses:\s*(.+)$").expect("valid regex"));
static PERMISSIONS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*permissions\s*:").expect("valid regex"));
static PR_TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bpull_request_target\b").expect("valid regex"));
static WRITE_ADMIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(write|admin)\b").expect("valid regex"));

fn indent_level(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Added + context lines of a hunk, in order. Removed lines are dropped so
/// block indentation walks see the post-change file shape.
fn collect_hunk_lines(hunk: &DiffHunk) -> Vec<&DiffLine> {
    hunk.lines
        .iter()
        .filter(|l| matches!(l.kind, LineKind::Add | LineKind::Context))
        .collect()
}

fn is_near_added(lines: &[&DiffLine], idx: usize) -> bool {
    let lo = idx.saturating_sub(ADDED_PROXIMITY);
    let hi = (idx + ADDED_PROXIMITY).min(lines.len() - 1);
    lines[lo..=hi].iter().any(|l| l.kind == LineKind::Add)
}

fn is_workflow_file(path: &str) -> bool {
    path.starts_with(WORKFLOW_PREFIX)
        && WORKFLOW_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

pub struct WorkflowPermissionsRule;

impl WorkflowPermissionsRule {
    fn scan_hunk(&self, file: &ChangedFile, hunk: &DiffHunk) -> Vec<RuleResult> {
        let mut results = Vec::new();
        let lines = collect_hunk_lines(hunk);

        for (i, dl) in lines.iter().enumerate() {
            let content = dl.content.as_str();

            if PERMISSIONS_RE.is_match(content) {
                results.extend(self.check_permissions_block(file, &lines, i));
            }

            if PR_TARGET_RE.is_match(content) && is_near_added(&lines, i) {
                results.push(RuleResult {
                    rule_id: self.id().to_string(),
                    severity: Severity::Error,
                    message: "pull_request_target trigger detected — runs with base repo secrets"
                        .to_string(),
                    file: file.path.clone(),
                    line: dl.new_line.or(dl.old_line),
                    evidence: Some(content.trim().to_string()),
                });
            }

            // Unpinned actions only matter on lines this PR adds.
            if dl.kind == LineKind::Add {
                if let Some(caps) = USES_RE.captures(content) {
                    let action_ref = caps[1].trim();
                    let pinned = action_ref.starts_with("./")
                        || action_ref.starts_with("docker://")
                        || SHA_PIN_RE.is_match(action_ref);
                    if !pinned {
                        results.push(RuleResult {
                            rule_id: self.id().to_string(),
                            severity: Severity::Warn,
                            message: format!(
                                "Unpinned action — use SHA instead of tag: {action_ref}"
                            ),
                            file: file.path.clone(),
                            line: dl.new_line,
                            evidence: Some(content.trim().to_string()),
                        });
                    }
                }
            }
        }

        results
    }

    /// Scan a `permissions:` block for write/admin grants. Covers both the
    /// scalar form (`permissions: write-all`) and indented children; the
    /// block ends at the first line indented at or above the header.
    fn check_permissions_block(
        &self,
        file: &ChangedFile,
        lines: &[&DiffLine],
        perm_idx: usize,
    ) -> Vec<RuleResult> {
        let mut results = Vec::new();
        let header = lines[perm_idx];
        let base_indent = indent_level(&header.content);

        if WRITE_ADMIN_RE.is_match(&header.content) && is_near_added(lines, perm_idx) {
            results.push(self.expanded_finding(file, header));
        }

        for j in perm_idx + 1..lines.len() {
            let child = lines[j];
            if indent_level(&child.content) <= base_indent {
                break;
            }
            if WRITE_ADMIN_RE.is_match(&child.content) && is_near_added(lines, j) {
                results.push(self.expanded_finding(file, child));
            }
        }

        results
    }

    fn expanded_finding(&self, file: &ChangedFile, dl: &DiffLine) -> RuleResult {
        RuleResult {
            rule_id: self.id().to_string(),
            severity: Severity::Error,
            message: "Workflow permissions expanded to write/admin".to_string(),
            file: file.path.clone(),
            line: dl.new_line.or(dl.old_line),
            evidence: Some(dl.content.trim().to_string()),
        }
    }
}

impl Rule for WorkflowPermissionsRule {
    fn id(&self) -> &'static str {
        "workflow-permissions-expanded"
    }

    fn description(&self) -> &'static str {
        "Block-aware scanning for dangerous GitHub Actions workflow patterns"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn run(&self, ctx: &RuleContext) -> Vec<RuleResult> {
        let mut results = Vec::new();
        for file in &ctx.files {
            if !is_workflow_file(&file.path) {
                continue;
            }
            for hunk in &file.hunks {
                results.extend(self.scan_hunk(file, hunk));
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RuleContext;
    use grippy_diff::parse_diff;
    use grippy_types::ProfileConfig;

    fn run_rule(diff: &str) -> Vec<RuleResult> {
        let ctx = RuleContext::new(
            diff,
            parse_diff(diff),
            ProfileConfig {
                name: "general".to_string(),
                fail_on: Severity::Critical,
            },
        );
        WorkflowPermissionsRule.run(&ctx)
    }

    #[test]
    fn added_write_permission_is_flagged() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,2 +1,4 @@
 name: ci
+permissions:
+  contents: write
 on: push
";
        let findings = run_rule(diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("write"));
        assert_eq!(findings[0].evidence.as_deref(), Some("contents: write"));
    }

    #[test]
    fn scalar_write_all_is_flagged() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,1 +1,2 @@
 name: ci
+permissions: write-all
";
        let findings = run_rule(diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].message,
            "Workflow permissions expanded to write/admin"
        );
    }

    #[test]
    fn read_only_permissions_pass() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,1 +1,3 @@
 name: ci
+permissions:
+  contents: read
";
        assert!(run_rule(diff).is_empty());
    }

    #[test]
    fn permissions_block_ends_at_dedent() {
        // write appears after the block closed; not part of permissions.
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,1 +1,4 @@
 name: ci
+permissions:
+  contents: read
+run: echo write
";
        assert!(run_rule(diff).is_empty());
    }

    #[test]
    fn preexisting_write_without_nearby_addition_passes() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,7 +1,8 @@
 permissions:
   contents: write
 name: ci
 on: push
 jobs:
   build:
+    timeout-minutes: 10
     runs-on: ubuntu-latest
";
        assert!(run_rule(diff).is_empty());
    }

    #[test]
    fn pull_request_target_near_addition_is_error() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,2 +1,3 @@
 name: ci
+on: pull_request_target
 jobs:
";
        let findings = run_rule(diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("pull_request_target"));
    }

    #[test]
    fn unpinned_action_on_added_line_warns() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,1 +1,2 @@
 name: ci
+      - uses: actions/checkout@v4
";
        let findings = run_rule(diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warn);
        assert!(findings[0].message.contains("Unpinned action"));
        assert!(findings[0].message.contains("actions/checkout@v4"));
    }

    #[test]
    fn sha_pinned_local_and_docker_actions_pass() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,1 +1,4 @@
 name: ci
+      - uses: actions/checkout@8f4b7f84864484a7bf31766abe9204da3cbe65b3
+      - uses: ./local/action
+      - uses: docker://alpine:3.19
";
        assert!(run_rule(diff).is_empty());
    }

    #[test]
    fn unpinned_check_skips_context_lines() {
        let diff = "\
diff --git a/.github/workflows/ci.yml b/.github/workflows/ci.yml
@@ -1,2 +1,3 @@
       - uses: actions/checkout@v4
+      - run: make test
 name: ci
";
        assert!(run_rule(diff).is_empty());
    }

    #[test]
    fn non_workflow_yaml_is_ignored() {
        let diff = "\
diff --git a/config/app.yml b/config/app.yml
@@ -1,1 +1,2 @@
 name: app
+permissions: write-all
";
        assert!(run_rule(diff).is_empty());
    }
}
