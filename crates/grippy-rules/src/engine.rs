//! Rule trait and the engine that drives a rule set over a context.

use std::panic::{self, AssertUnwindSafe};

use grippy_types::{ProfileConfig, RuleResult, Severity};
use tracing::error;

use crate::context::RuleContext;
use crate::{
    CiScriptRiskRule, DangerousSinksRule, LlmOutputSinksRule, PathTraversalRule,
    SecretsInDiffRule, WorkflowPermissionsRule,
};

/// A deterministic security rule.
///
/// `run` must be a pure function of the context. The engine guards
/// against panics, but a panicking rule loses all of its findings for
/// that run, so rules should degrade gracefully instead.
pub trait Rule: Send + Sync {
    /// Stable identifier, e.g. `secrets-in-diff`.
    fn id(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn default_severity(&self) -> Severity;
    fn run(&self, ctx: &RuleContext) -> Vec<RuleResult>;
}

/// The built-in rule set, in evaluation order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(WorkflowPermissionsRule),
        Box::new(SecretsInDiffRule),
        Box::new(DangerousSinksRule),
        Box::new(PathTraversalRule),
        Box::new(LlmOutputSinksRule),
        Box::new(CiScriptRiskRule),
    ]
}

/// Runs a fixed list of rules and applies the severity gate.
pub struct RuleEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleEngine {
    pub fn new(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Box<dyn Rule>] {
        &self.rules
    }

    /// Run every rule, concatenating findings in rule order.
    ///
    /// A panic inside one rule is caught and logged; the remaining rules
    /// still run.
    pub fn run(&self, ctx: &RuleContext) -> Vec<RuleResult> {
        let mut findings = Vec::new();
        for rule in &self.rules {
            match panic::catch_unwind(AssertUnwindSafe(|| rule.run(ctx))) {
                Ok(results) => findings.extend(results),
                Err(_) => {
                    error!(rule = rule.id(), "rule panicked, dropping its findings");
                }
            }
        }
        findings
    }

    /// True when any finding reaches the profile's `fail_on` threshold.
    pub fn check_gate(&self, findings: &[RuleResult], profile: &ProfileConfig) -> bool {
        findings.iter().any(|f| f.severity >= profile.fail_on)
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
