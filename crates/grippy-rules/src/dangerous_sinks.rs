//! Rule 3: `dangerous-execution-sinks`.
//!
//! eval/exec/subprocess/pickle in Python, plus the JS/TS equivalents.

use std::sync::LazyLock;

use grippy_types::{RuleResult, Severity};
use regex::Regex;

use crate::context::{added_lines, RuleContext};
use crate::engine::Rule;

static PYTHON_SINKS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let compile = |pattern: &str| Regex::new(pattern).expect("valid regex");
    vec![
        ("eval()", compile(r"\beval\s*\(")),
        ("exec()", compile(r"\bexec\s*\(")),
        ("os.system()", compile(r"\bos\.system\s*\(")),
        ("os.popen()", compile(r"\bos\.popen\s*\(")),
        (
            "subprocess with shell=True",
            compile(r"\bsubprocess\.\w+\(.*shell\s*=\s*True"),
        ),
        ("pickle.loads()", compile(r"\bpickle\.loads?\s*\(")),
        ("marshal.loads()", compile(r"\bmarshal\.loads?\s*\(")),
    ]
});

// yaml.load is only a sink without a safe loader on the same line.
static YAML_LOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\byaml\.load\s*\(").expect("valid regex"));
static YAML_SAFE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:yaml\.safe_load|SafeLoader|CSafeLoader)\b").expect("valid regex")
});

static JS_SINKS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    let compile = |pattern: &str| Regex::new(pattern).expect("valid regex");
    vec![
        ("eval()", compile(r"\beval\s*\(")),
        ("new Function()", compile(r"\bnew\s+Function\s*\(")),
        (
            "require('child_process')",
            compile(r#"require\s*\(\s*['"]child_process['"]\s*\)"#),
        ),
        ("execSync()", compile(r"\bexecSync\s*\(")),
        ("spawnSync()", compile(r"\bspawnSync\s*\(")),
    ]
});

const PYTHON_EXTENSIONS: [&str; 1] = [".py"];
const JS_EXTENSIONS: [&str; 4] = [".js", ".ts", ".jsx", ".tsx"];

fn file_ext(path: &str) -> &str {
    path.rfind('.').map(|dot| &path[dot..]).unwrap_or("")
}

pub struct DangerousSinksRule;

impl DangerousSinksRule {
    fn sink_finding(&self, name: &str, path: &str, lineno: u32, content: &str) -> RuleResult {
        RuleResult {
            rule_id: self.id().to_string(),
            severity: self.default_severity(),
            message: format!("Dangerous execution sink: {name}"),
            file: path.to_string(),
            line: Some(lineno),
            evidence: Some(content.trim().to_string()),
        }
    }

    fn scan_python(&self, path: &str, lines: Vec<(u32, &str)>) -> Vec<RuleResult> {
        let mut results = Vec::new();
        for (lineno, content) in lines {
            for (name, pattern) in PYTHON_SINKS.iter() {
                if pattern.is_match(content) {
                    results.push(self.sink_finding(name, path, lineno, content));
                    break;
                }
            }

            if YAML_LOAD_RE.is_match(content) && !YAML_SAFE_RE.is_match(content) {
                results.push(self.sink_finding(
                    "yaml.load() without SafeLoader",
                    path,
                    lineno,
                    content,
                ));
            }
        }
        results
    }

    fn scan_js(&self, path: &str, lines: Vec<(u32, &str)>) -> Vec<RuleResult> {
        let mut results = Vec::new();
        for (lineno, content) in lines {
            for (name, pattern) in JS_SINKS.iter() {
                if pattern.is_match(content) {
                    results.push(self.sink_finding(name, path, lineno, content));
                    break;
                }
            }
        }
        results
    }
}

impl Rule for DangerousSinksRule {
    fn id(&self) -> &'static str {
        "dangerous-execution-sinks"
    }

    fn description(&self) -> &'static str {
        "Flag eval, exec, subprocess shell=True, pickle, and JS equivalents"
    }

    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    fn run(&self, ctx: &RuleContext) -> Vec<RuleResult> {
        let mut results = Vec::new();
        for file in &ctx.files {
            let ext = file_ext(&file.path);
            let lines: Vec<(u32, &str)> = added_lines(file).collect();
            if PYTHON_EXTENSIONS.contains(&ext) {
                results.extend(self.scan_python(&file.path, lines));
            } else if JS_EXTENSIONS.contains(&ext) {
                results.extend(self.scan_js(&file.path, lines));
            }
        }
        results
    }
}
