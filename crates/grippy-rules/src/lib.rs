//! Deterministic security rules evaluated over a parsed PR diff.
//!
//! Each rule is a pure function of the [`RuleContext`]: same diff and
//! profile in, same findings out. The engine isolates rule panics so one
//! misbehaving rule can never take down a review run.

mod ci_script_risk;
mod context;
mod dangerous_sinks;
mod engine;
mod llm_output_sinks;
mod path_traversal;
mod secrets_in_diff;
mod workflow_permissions;

pub use ci_script_risk::CiScriptRiskRule;
pub use context::{added_lines, AddedLine, RuleContext};
pub use dangerous_sinks::DangerousSinksRule;
pub use engine::{default_rules, Rule, RuleEngine};
pub use llm_output_sinks::LlmOutputSinksRule;
pub use path_traversal::PathTraversalRule;
pub use secrets_in_diff::SecretsInDiffRule;
pub use workflow_permissions::WorkflowPermissionsRule;
