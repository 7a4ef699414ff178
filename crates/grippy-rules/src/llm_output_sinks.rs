//! Rule 5: `llm-output-unsanitized`.
//!
//! Model output flowing into an output sink with no sanitizer on the
//! added lines in between. The scan is hunk-local: chains that span
//! hunks are out of reach by construction.

use std::sync::LazyLock;

use grippy_diff::DiffHunk;
use grippy_types::{RuleResult, Severity};
use regex::Regex;

use crate::context::RuleContext;
use crate::engine::Rule;

/// Sanitizer names that break a model-output chain.
const SANITIZERS: [&str; 9] = [
    "sanitize",
    "escape",
    "html.escape",
    "markupsafe.escape",
    "clean",
    "sanitize_comment",
    "_sanitize_comment_text",
    "_escape_xml",
    "bleach.clean",
];

static MODEL_OUTPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\.run\(|\.chat\(|\.content\b|\.choices\b|\.generate\(|completion\b)")
        .expect("valid regex")
});

static SINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:create_comment\(|create_issue_comment\(|\.body\s*=|post\(|render\(|f"<)"#)
        .expect("valid regex")
});

static SANITIZER_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = SANITIZERS
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&pattern).expect("valid regex")
});

pub struct LlmOutputSinksRule;

impl LlmOutputSinksRule {
    fn scan_hunk(&self, path: &str, hunk: &DiffHunk) -> Vec<RuleResult> {
        let mut results = Vec::new();

        let added: Vec<(u32, &str)> = hunk
            .lines
            .iter()
            .filter(|l| l.kind == grippy_diff::LineKind::Add)
            .filter_map(|l| l.new_line.map(|n| (n, l.content.as_str())))
            .collect();

        for (i, (_, content)) in added.iter().enumerate() {
            if !MODEL_OUTPUT_RE.is_match(content) {
                continue;
            }

            // Forward scan for the first sink; the output line itself may
            // be the sink.
            for j in i..added.len() {
                let (sink_line, sink_content) = added[j];
                if !SINK_RE.is_match(sink_content) {
                    continue;
                }
                let between = added[i..=j]
                    .iter()
                    .map(|(_, c)| *c)
                    .collect::<Vec<_>>()
                    .join(" ");
                if !SANITIZER_RE.is_match(&between) {
                    results.push(RuleResult {
                        rule_id: self.id().to_string(),
                        severity: self.default_severity(),
                        message: "LLM output used in sink without sanitization".to_string(),
                        file: path.to_string(),
                        line: Some(sink_line),
                        evidence: Some(sink_content.trim().to_string()),
                    });
                }
                break;
            }
        }

        results
    }
}

impl Rule for LlmOutputSinksRule {
    fn id(&self) -> &'static str {
        "llm-output-unsanitized"
    }

    fn description(&self) -> &'static str {
        "Flag model output used in sinks without sanitizer in between"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn run(&self, ctx: &RuleContext) -> Vec<RuleResult> {
        let mut results = Vec::new();
        for file in &ctx.files {
            if !file.path.ends_with(".py") {
                continue;
            }
            for hunk in &file.hunks {
                results.extend(self.scan_hunk(&file.path, hunk));
            }
        }
        results
    }
}
