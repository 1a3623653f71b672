//! Fuzz target for chat-line parsing
//!
//! Parsed lines must format back to an equivalent line.

#![no_main]

use hushwire_crypto::ChatLine;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(line) = data.parse::<ChatLine>() {
        let reparsed: ChatLine = line.to_string().parse().expect("reparse chat line");
        assert_eq!(reparsed, line);
    }
});
