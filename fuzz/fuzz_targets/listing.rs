#![no_main]

use gtest_syntax::{parse_listing, render_listing};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Anything that parses must survive a render/parse round.
        if let Ok(tests) = parse_listing(s) {
            let names: Vec<_> = tests.into_iter().map(|t| t.name).collect();
            let reparsed = parse_listing(&render_listing(&names)).expect("rendered listing must parse");
            assert_eq!(reparsed.len(), names.len());
        }
    }
});
