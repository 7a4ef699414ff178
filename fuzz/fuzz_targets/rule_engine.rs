#![no_main]

use libfuzzer_sys::fuzz_target;

use grippy_diff::parse_diff;
use grippy_rules::{RuleContext, RuleEngine};
use grippy_types::{ProfileConfig, Severity};

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let files = parse_diff(&s);
    let profile = ProfileConfig {
        name: "strict-security".to_string(),
        fail_on: Severity::Warn,
    };
    let ctx = RuleContext::new(s.as_ref(), files, profile);
    let _ = RuleEngine::default().run(&ctx);
});
