//! Rule 6: `ci-script-execution-risk`.
//!
//! curl|bash, sudo, and chmod +x in CI and infrastructure files.

use std::sync::LazyLock;

use grippy_types::{RuleResult, Severity};
use regex::Regex;

use crate::context::{added_lines, RuleContext};
use crate::engine::Rule;

const CI_FILE_PREFIXES: [&str; 4] = [".github/workflows/", "Dockerfile", "Makefile", "scripts/"];
const SHELL_EXTENSIONS: [&str; 2] = [".sh", ".bash"];

static PIPE_EXEC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:curl|wget)\b.*\|\s*(?:ba)?sh\b").expect("valid regex"));
static SUDO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bsudo\b").expect("valid regex"));
static CHMOD_X_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bchmod\s+\+x\b").expect("valid regex"));

fn is_ci_file(path: &str) -> bool {
    if CI_FILE_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return true;
    }
    let basename = path.rsplit('/').next().unwrap_or(path);
    if basename.starts_with("Dockerfile") || basename == "Makefile" {
        return true;
    }
    SHELL_EXTENSIONS.iter().any(|ext| basename.ends_with(ext))
}

pub struct CiScriptRiskRule;

impl CiScriptRiskRule {
    fn finding(
        &self,
        severity: Severity,
        message: &str,
        path: &str,
        lineno: u32,
        content: &str,
    ) -> RuleResult {
        RuleResult {
            rule_id: self.id().to_string(),
            severity,
            message: message.to_string(),
            file: path.to_string(),
            line: Some(lineno),
            evidence: Some(content.trim().to_string()),
        }
    }
}

impl Rule for CiScriptRiskRule {
    fn id(&self) -> &'static str {
        "ci-script-execution-risk"
    }

    fn description(&self) -> &'static str {
        "Flag curl|bash, sudo, and chmod+x patterns in CI files"
    }

    fn default_severity(&self) -> Severity {
        Severity::Warn
    }

    fn run(&self, ctx: &RuleContext) -> Vec<RuleResult> {
        let mut results = Vec::new();
        for file in &ctx.files {
            if !is_ci_file(&file.path) {
                continue;
            }
            for (lineno, content) in added_lines(file) {
                // Checked in severity order; one finding per line.
                if PIPE_EXEC_RE.is_match(content) {
                    results.push(self.finding(
                        Severity::Critical,
                        "Remote script piped to shell — supply chain risk",
                        &file.path,
                        lineno,
                        content,
                    ));
                } else if SUDO_RE.is_match(content) {
                    results.push(self.finding(
                        Severity::Warn,
                        "sudo usage in CI context",
                        &file.path,
                        lineno,
                        content,
                    ));
                } else if CHMOD_X_RE.is_match(content) {
                    results.push(self.finding(
                        Severity::Warn,
                        "chmod +x in CI context — verify target script",
                        &file.path,
                        lineno,
                        content,
                    ));
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
        CiScriptRiskRule.run(&ctx)
    }

    fn addition_diff(path: &str, line: &str) -> String {
        format!("diff --git a/{path} b/{path}\n@@ -1,0 +1,1 @@\n+{line}\n")
    }

    #[test]
    fn curl_piped_to_bash_is_critical() {
        let diff = addition_diff("scripts/install.sh", "curl -fsSL https://get.tool.dev | bash");
        let findings = run_rule(&diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
        assert!(findings[0].message.contains("supply chain"));
    }

    #[test]
    fn wget_piped_to_sh_is_critical() {
        let diff = addition_diff("Makefile", "\twget -qO- https://example.com/setup | sh");
        let findings = run_rule(&diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn sudo_is_warn() {
        let diff = addition_diff(".github/workflows/ci.yml", "      - run: sudo apt-get update");
        let findings = run_rule(&diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warn);
        assert!(findings[0].message.contains("sudo"));
    }

    #[test]
    fn chmod_x_is_warn() {
        let diff = addition_diff("deploy/run.sh", "chmod +x ./target/release/app");
        let findings = run_rule(&diff);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("chmod +x"));
    }

    #[test]
    fn pipe_to_shell_outranks_sudo_on_one_line() {
        let diff = addition_diff("scripts/boot.sh", "curl https://x.dev | bash && sudo reboot");
        let findings = run_rule(&diff);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Critical);
    }

    #[test]
    fn dockerfile_variants_are_ci_files() {
        assert!(is_ci_file("Dockerfile"));
        assert!(is_ci_file("docker/Dockerfile.prod"));
        assert!(is_ci_file("Makefile"));
        assert!(is_ci_file("build/run.bash"));
        assert!(!is_ci_file("src/main.py"));
        assert!(!is_ci_file("docs/Makefile.md"));
    }

    #[test]
    fn non_ci_files_are_ignored() {
        let diff = addition_diff("src/setup.py", "os.system(\"sudo make install\")");
        assert!(run_rule(&diff).is_empty());
    }
}
