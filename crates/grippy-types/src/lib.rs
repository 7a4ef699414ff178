//! Shared data types for grippy.
//!
//! This crate is intentionally dependency-light: plain serde/schemars DTOs
//! plus the review profile table. No parsing or rule logic lives here.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Schema identifier embedded in every rules receipt.
pub const RULES_SCHEMA_V1: &str = "grippy.rules.v1";

/// Environment variable consulted when no profile is given on the CLI.
pub const PROFILE_ENV: &str = "GRIPPY_PROFILE";

/// Finding severity, ordered from least to most severe.
///
/// The derived `Ord` is load-bearing: the review gate compares findings
/// against a profile threshold with `>=`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }

    /// Uppercase tag used in rendered finding lines, e.g. `[CRITICAL]`.
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding produced by one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleResult {
    /// Stable rule identifier, e.g. `secrets-in-diff`.
    pub rule_id: String,
    pub severity: Severity,
    /// Human-readable description of what was detected.
    pub message: String,
    /// Path of the file the finding refers to, as it appears in the diff.
    pub file: String,
    /// New-side line number, when the finding points at a specific line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Short excerpt of the offending content. Secret material is redacted
    /// before it lands here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// A named review profile: the severity at which the gate fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProfileConfig {
    pub name: String,
    /// Findings at or above this severity fail the review gate.
    pub fail_on: Severity,
}

/// The built-in profile table, from most to least permissive.
pub fn profiles() -> Vec<ProfileConfig> {
    vec![
        ProfileConfig {
            name: "general".to_string(),
            fail_on: Severity::Critical,
        },
        ProfileConfig {
            name: "security".to_string(),
            fail_on: Severity::Error,
        },
        ProfileConfig {
            name: "strict-security".to_string(),
            fail_on: Severity::Warn,
        },
    ]
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("unknown profile '{name}' (valid profiles: general, security, strict-security)")]
    Unknown { name: String },
}

/// Resolve the active profile: CLI value wins, then `GRIPPY_PROFILE`,
/// then `general`.
pub fn load_profile(cli: Option<&str>) -> Result<ProfileConfig, ProfileError> {
    let env = std::env::var(PROFILE_ENV).ok();
    resolve_profile(cli, env.as_deref())
}

fn resolve_profile(cli: Option<&str>, env: Option<&str>) -> Result<ProfileConfig, ProfileError> {
    let name = cli.or(env).unwrap_or("general");
    profiles()
        .into_iter()
        .find(|p| p.name == name)
        .ok_or_else(|| ProfileError::Unknown {
            name: name.to_string(),
        })
}

/// Number of findings at each severity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema,
)]
pub struct SeverityCounts {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub info: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub warn: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub error: u32,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub critical: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl SeverityCounts {
    pub fn bump(&mut self, severity: Severity) {
        let slot = match severity {
            Severity::Info => &mut self.info,
            Severity::Warn => &mut self.warn,
            Severity::Error => &mut self.error,
            Severity::Critical => &mut self.critical,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.info
            .saturating_add(self.warn)
            .saturating_add(self.error)
            .saturating_add(self.critical)
    }
}

/// Tool identity stamped into receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

/// Gate outcome for one review run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewVerdict {
    /// True when any finding reached the profile's `fail_on` threshold.
    pub gate_failed: bool,
    pub fail_on: Severity,
    pub counts: SeverityCounts,
}

/// Machine-readable record of a full review run (`grippy.rules.v1`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewReceipt {
    /// Always [`RULES_SCHEMA_V1`].
    pub schema: String,
    pub tool: ToolMeta,
    pub profile: String,
    pub findings: Vec<RuleResult>,
    pub verdict: ReviewVerdict,
}
