//! Fuzz target for document JSONL parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spanscore::ir::io_jsonl::from_jsonl_str;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(documents) = from_jsonl_str(text) {
        for document in &documents {
            let _ = document.validate_references();
        }
    }
});
