//! Rendering findings for humans and for GitHub Actions.
//!
//! Everything that leaves the process goes through [`sanitize_field`]
//! first: finding text is built from diff content, and diff content is
//! attacker-controlled.

use grippy_types::{RuleResult, Severity};

/// Strip control characters (except tab) and invisible/banned Unicode:
/// zero-width characters and bidi override marks that could smuggle
/// instructions into rendered output.
pub fn sanitize_field(text: &str) -> String {
    text.chars()
        .filter(|&c| !is_disallowed(c))
        .collect()
}

fn is_disallowed(c: char) -> bool {
    (c.is_control() && c != '\t')
        || matches!(
            c,
            '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{FEFF}'
        )
}

/// Sanitize and HTML-escape a field for embedding in markup-adjacent
/// output such as PR comments.
fn escape_field(text: &str) -> String {
    sanitize_field(text)
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// One line per finding:
/// `[SEVERITY] rule-id @ file:line: message | evidence: ...`
pub fn format_rule_findings(findings: &[RuleResult]) -> String {
    findings
        .iter()
        .map(|f| {
            let mut line = format!(
                "[{}] {} @ {}",
                f.severity.tag(),
                escape_field(&f.rule_id),
                escape_field(&f.file)
            );
            if let Some(lineno) = f.line {
                line.push_str(&format!(":{lineno}"));
            }
            line.push_str(&format!(": {}", escape_field(&f.message)));
            if let Some(evidence) = &f.evidence {
                line.push_str(&format!(" | evidence: {}", escape_field(evidence)));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn annotation_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "notice",
        Severity::Warn => "warning",
        Severity::Error | Severity::Critical => "error",
    }
}

/// GitHub Actions workflow commands, one per finding.
pub fn render_annotations(findings: &[RuleResult]) -> Vec<String> {
    findings
        .iter()
        .map(|f| {
            let level = annotation_level(f.severity);
            let file = sanitize_field(&f.file);
            let message = sanitize_field(&f.message);
            match f.line {
                Some(line) => format!(
                    "::{level} file={file},line={line}::{rule} {message}",
                    rule = f.rule_id
                ),
                None => format!("::{level} file={file}::{rule} {message}", rule = f.rule_id),
            }
        })
        .collect()
}
