//! Fuzz target for the Salsa20 stream cipher
//!
//! Encrypt then decrypt with the same key and nonce must restore the input.

#![no_main]

use arbitrary::Arbitrary;
use hushwire_crypto::Salsa20;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Salsa20Input {
    key: Vec<u8>,
    nonce: Vec<u8>,
    counter: u64,
    plaintext: Vec<u8>,
}

fuzz_target!(|input: Salsa20Input| {
    // Arbitrary key and nonce lengths must be rejected, not panic
    let Ok(mut cipher) = Salsa20::new(&input.key, &input.nonce) else {
        return;
    };
    cipher.seek(input.counter);
    let ciphertext = cipher.encrypt(&input.plaintext);
    assert_eq!(ciphertext.len(), input.plaintext.len());

    let Ok(mut cipher) = Salsa20::new(&input.key, &input.nonce) else {
        return;
    };
    cipher.seek(input.counter);
    assert_eq!(cipher.decrypt(&ciphertext), input.plaintext);
});
