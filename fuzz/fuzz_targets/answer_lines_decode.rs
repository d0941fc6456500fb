//! Fuzz target for the line-oriented answer decoders.

#![no_main]

use libfuzzer_sys::fuzz_target;
use spanscore::codec::Format;
use spanscore::ir::{Document, Mention};

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }
    let Ok(answer) = std::str::from_utf8(data) else {
        return;
    };

    let reference = Document::from_whitespace("fuzz", "the clerk checks the invoice .")
        .with_mentions(vec![
            Mention::new("actor", vec![0, 1]),
            Mention::new("activity", vec![2]),
        ]);
    for format in [Format::Relations, Format::Entities, Format::Constraints] {
        if let Ok(decoded) = format.decode(&reference, answer) {
            assert!(decoded.document.validate_references().is_ok());
        }
    }
});
