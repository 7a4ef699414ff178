#![no_main]

use libfuzzer_sys::fuzz_target;

use grippy_diff::parse_diff;

fuzz_target!(|data: &[u8]| {
    let s = String::from_utf8_lossy(data);
    let files = parse_diff(&s);
    for file in &files {
        for hunk in &file.hunks {
            // Line numbers on the new side never run backwards.
            let mut last = 0u32;
            for line in &hunk.lines {
                if let Some(n) = line.new_line {
                    assert!(n >= last);
                    last = n;
                }
            }
        }
    }
});
