//! Review orchestration: parse the diff, run the rule engine, and turn
//! findings into the shapes consumers need (receipt, rendered text,
//! annotations, inline/off-diff split, exit code).

mod classify;
mod render;
mod review;

pub use classify::classify_findings;
pub use render::{format_rule_findings, render_annotations, sanitize_field};
pub use review::{check_gate, run_review, run_rules, ReviewRun};
