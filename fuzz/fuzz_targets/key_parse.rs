//! Fuzz target for key string parsing
//!
//! Anything that parses must print back to a string that parses to the same key.

#![no_main]

use hushwire_crypto::{RsaPrivateKey, RsaPublicKey};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    if let Ok(public) = data.parse::<RsaPublicKey>() {
        let reparsed: RsaPublicKey = public.to_string().parse().expect("reparse public key");
        assert_eq!(reparsed, public);
        let _ = public.encrypt(data.as_bytes());
    }

    if let Ok(private) = data.parse::<RsaPrivateKey>() {
        let reparsed: RsaPrivateKey = private.to_string().parse().expect("reparse private key");
        assert_eq!(reparsed, private);
    }
});
