//! Split findings into ones a review comment can anchor to and ones it
//! cannot.

use std::collections::{BTreeMap, BTreeSet};

use grippy_types::RuleResult;

/// Partition `findings` against the addressability index from
/// [`grippy_diff::parse_diff_lines`].
///
/// A finding is inline only when its file appears in the index and its
/// line is one of that file's addressable new-side lines; everything
/// else (unknown file, no line, removed-side line) goes off-diff.
pub fn classify_findings(
    findings: Vec<RuleResult>,
    diff_lines: &BTreeMap<String, BTreeSet<u32>>,
) -> (Vec<RuleResult>, Vec<RuleResult>) {
    let mut inline = Vec::new();
    let mut off_diff = Vec::new();

    for finding in findings {
        let addressable = finding.line.is_some_and(|line| {
            diff_lines
                .get(&finding.file)
                .is_some_and(|lines| lines.contains(&line))
        });
        if addressable {
            inline.push(finding);
        } else {
            off_diff.push(finding);
        }
    }

    (inline, off_diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grippy_types::Severity;

    fn finding(file: &str, line: Option<u32>) -> RuleResult {
        RuleResult {
            rule_id: "dangerous-execution-sinks".to_string(),
            severity: Severity::Error,
            message: "Dangerous execution sink: eval()".to_string(),
            file: file.to_string(),
            line,
            evidence: None,
        }
    }

    fn index(entries: &[(&str, &[u32])]) -> BTreeMap<String, BTreeSet<u32>> {
        entries
            .iter()
            .map(|(path, lines)| (path.to_string(), lines.iter().copied().collect()))
            .collect()
    }

    #[test]
    fn addressable_finding_goes_inline() {
        let idx = index(&[("src/app.py", &[1, 2, 3])]);
        let (inline, off_diff) = classify_findings(vec![finding("src/app.py", Some(2))], &idx);
        assert_eq!(inline.len(), 1);
        assert!(off_diff.is_empty());
    }

    #[test]
    fn line_outside_the_diff_goes_off_diff() {
        let idx = index(&[("src/app.py", &[1, 2, 3])]);
        let (inline, off_diff) = classify_findings(vec![finding("src/app.py", Some(40))], &idx);
        assert!(inline.is_empty());
        assert_eq!(off_diff.len(), 1);
    }

    #[test]
    fn unknown_file_goes_off_diff() {
        let idx = index(&[("src/app.py", &[1])]);
        let (inline, off_diff) = classify_findings(vec![finding("src/other.py", Some(1))], &idx);
        assert!(inline.is_empty());
        assert_eq!(off_diff.len(), 1);
    }

    #[test]
    fn finding_without_a_line_goes_off_diff() {
        let idx = index(&[("src/app.py", &[1])]);
        let (_, off_diff) = classify_findings(vec![finding("src/app.py", None)], &idx);
        assert_eq!(off_diff.len(), 1);
    }

    #[test]
    fn file_with_empty_line_set_goes_off_diff() {
        // Binary or delete-only entries index to an empty set.
        let idx = index(&[("logo.png", &[])]);
        let (inline, off_diff) = classify_findings(vec![finding("logo.png", Some(1))], &idx);
        assert!(inline.is_empty());
        assert_eq!(off_diff.len(), 1);
    }

    #[test]
    fn mixed_findings_preserve_order_within_each_bucket() {
        let idx = index(&[("src/app.py", &[1, 2])]);
        let (inline, off_diff) = classify_findings(
            vec![
                finding("src/app.py", Some(1)),
                finding("src/app.py", Some(9)),
                finding("src/app.py", Some(2)),
            ],
            &idx,
        );
        assert_eq!(
            inline.iter().map(|f| f.line).collect::<Vec<_>>(),
            vec![Some(1), Some(2)]
        );
        assert_eq!(off_diff[0].line, Some(9));
    }
}
