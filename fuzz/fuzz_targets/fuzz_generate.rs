#![no_main]

use joltgen_core::{
    classify, filter_empty_operations, generate, parse_operations, GenerateRequest, ParsedRequest,
};
use libfuzzer_sys::fuzz_target;

// Accepts arbitrary bytes, attempts to parse as JSON, and feeds the value to
// every entry point that accepts it. Goal: no panics, even on odd input.
fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    if let Ok(request) = serde_json::from_value::<GenerateRequest>(value.clone()) {
        let _ = generate(&request, &Default::default());
    }

    if let Ok(parsed) = serde_json::from_value::<ParsedRequest>(value.clone()) {
        let _ = classify(&parsed);
    }

    if let Ok(ops) = parse_operations(value) {
        let once = filter_empty_operations(ops);
        assert_eq!(filter_empty_operations(once.clone()), once);
    }
});

