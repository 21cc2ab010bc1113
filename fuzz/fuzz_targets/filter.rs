#![no_main]

use gtest_syntax::{Filter, TestName};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (&str, &str)| {
    let (expr, name) = data;
    if let (Ok(filter), Ok(name)) = (Filter::parse(expr), TestName::parse(name)) {
        let _ = filter.matches(name.as_str());
        assert!(Filter::exact(&name).matches(name.as_str()));
    }
});
