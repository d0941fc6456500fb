//! Fuzz target for the span-tagging decoder.
//!
//! Arbitrary text is decoded against a fixed reference document. Decoding
//! must either fail cleanly or produce mentions that point at real tokens.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spanscore::codec::tagging::decode_mentions;
use spanscore::ir::Document;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let reference = Document::from_whitespace("fuzz", "the clerk checks the invoice .");
    if let Ok((mentions, _report)) = decode_mentions(&reference, text) {
        for mention in &mentions {
            assert!(!mention.token_document_indices.is_empty());
            for &index in &mention.token_document_indices {
                assert!(index < reference.tokens.len());
            }
        }
    }
});
