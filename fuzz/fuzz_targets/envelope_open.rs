//! Fuzz target for envelope decryption
//!
//! Opening attacker-controlled envelopes must fail cleanly, never panic.

#![no_main]

use arbitrary::Arbitrary;
use hushwire_crypto::{Envelope, RsaPrivateKey};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct EnvelopeInput {
    encrypted_sym_key: String,
    encrypted_message: String,
    json: String,
}

// p = 61, q = 53
const TEXTBOOK_KEY: &str = "3233,17,2753";

fuzz_target!(|input: EnvelopeInput| {
    let Ok(private) = TEXTBOOK_KEY.parse::<RsaPrivateKey>() else {
        return;
    };

    let envelope = Envelope {
        encrypted_sym_key: input.encrypted_sym_key,
        encrypted_message: input.encrypted_message,
    };
    let _ = envelope.open(&private);

    // Fuzz the JSON wire form
    if let Ok(envelope) = Envelope::from_json(&input.json) {
        let _ = envelope.open(&private);
    }
});
