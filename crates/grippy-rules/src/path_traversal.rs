//! Rule 4: `path-traversal-risk`.
//!
//! File operations whose arguments carry a user-input indicator or a
//! `../` traversal literal. Pure string-literal arguments are exempt.

use std::sync::LazyLock;

use grippy_types::{RuleResult, Severity};
use regex::Regex;

use crate::context::RuleContext;
use crate::engine::Rule;

/// Identifier fragments that suggest user-controlled input.
const TAINT_NAMES: [&str; 10] = [
    "user", "request", "input", "filename", "url", "param", "query", "upload", "form", "body",
];

static FILE_OPS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:open|Path|path\.join|os\.path\.join|read_file|write_file|send_file)\s*\(")
        .expect("valid regex")
});

static TRAVERSAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\.\./|\.\.\\)").expect("valid regex"));

// A single quoted-literal argument is static by construction.
static STRING_LITERAL_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:open|Path|path\.join|os\.path\.join)\s*\(\s*["'][^"']*["']\s*[,)]"#)
        .expect("valid regex")
});

/// Does any taint name appear as an identifier component of the argument
/// portion? Splits on non-alphabetic characters, so `user_path` exposes
/// `user` but camelCase compounds stay whole.
fn has_taint_indicator(content: &str) -> bool {
    let args = match content.find('(') {
        Some(idx) => &content[idx..],
        None => content,
    };
    args.to_lowercase()
        .split(|c: char| !c.is_ascii_alphabetic())
        .any(|part| TAINT_NAMES.contains(&part))
}

pub struct PathTraversalRule;

impl Rule for PathTraversalRule {
    fn id(&self) -> &'static str {
        "path-traversal-risk"
    }

    fn description(&self) -> &'static str {
        "Flag file operations with user-controlled input indicators"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warn
    }

    fn run(&self, ctx: &RuleContext) -> Vec<RuleResult> {
        let mut results = Vec::new();
        for added in ctx.added_lines_for("*.{py,js,ts}") {
            let content = added.content;

            if STRING_LITERAL_ONLY_RE.is_match(content) {
                continue;
            }
            if !FILE_OPS_RE.is_match(content) {
                continue;
            }

            let message = if has_taint_indicator(content) {
                "File operation with user-controlled input indicator"
            } else if TRAVERSAL_RE.is_match(content) {
                "Path traversal pattern in file operation"
            } else {
                continue;
            };

            results.push(RuleResult {
                rule_id: self.id().to_string(),
                severity: self.default_severity(),
                message: message.to_string(),
                file: added.file.to_string(),
                line: Some(added.line),
                evidence: Some(content.trim().to_string()),
            });
        }
        results
    }
}
