#![no_main]

use libfuzzer_sys::fuzz_target;

use grippy_diff::{parse_diff, parse_diff_lines};

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let index = parse_diff_lines(&s);
    let files = parse_diff(&s);
    // Every indexed file must come from a parsed header.
    for path in index.keys() {
        assert!(files.iter().any(|f| &f.path == path));
    }
});
