//! Integration tests for cross-module interactions.
//!
//! Walks the full chat flow: key exchange via key strings, sealing for a
//! contact, framing as chat lines, and reading a stored history back.

use hushwire_crypto::rsa::{MIN_MODULUS_BITS, generate_key_pair};
use hushwire_crypto::{ChatLine, CryptoError, Envelope, RsaPrivateKey, RsaPublicKey};
use hushwire_integration_tests::{alice, bob, carol};
use num_bigint::BigUint;
use rand_core::OsRng;
use std::collections::HashMap;
use std::fs;

// ============================================================================
// Key Exchange
// ============================================================================

#[test]
fn test_public_key_string_exchange() {
    // Bob publishes "n,e"; Alice stores it and seals to the parsed key.
    let published = bob().public.to_string();
    assert_eq!(published.split(',').count(), 2);

    let mut contact_keys: HashMap<&str, RsaPublicKey> = HashMap::new();
    contact_keys.insert("bob", published.parse().unwrap());

    let envelope = Envelope::seal("hi bob", &contact_keys["bob"]).unwrap();
    assert_eq!(envelope.open(&bob().private).unwrap(), "hi bob");
}

#[test]
fn test_private_key_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alice.key");

    fs::write(&path, format!("{}\n", alice().private)).unwrap();
    let restored: RsaPrivateKey = fs::read_to_string(&path).unwrap().parse().unwrap();

    assert_eq!(restored, alice().private);
    let envelope = Envelope::seal("from disk", &alice().public).unwrap();
    assert_eq!(envelope.open(&restored).unwrap(), "from disk");
}

#[test]
fn test_generated_keys_have_requested_width() {
    for bits in [MIN_MODULUS_BITS, 63, 128, 257] {
        let (private, public) = generate_key_pair(&mut OsRng, bits).unwrap();
        assert_eq!(public.bits(), bits);
        assert_eq!(private.public_key(), public);
    }
    assert_eq!(carol().public.bits(), 1024);
}

// ============================================================================
// Chat Flow
// ============================================================================

#[test]
fn test_two_party_conversation() {
    let transcript = [
        (alice(), bob(), "hey, are we still on for tomorrow?"),
        (bob(), alice(), "yes! 10am works"),
        (alice(), bob(), "great, see you then 👋"),
    ];

    for (from, to, text) in transcript {
        let wire = ChatLine::seal(from.name, text, &to.public).unwrap().to_string();
        assert!(wire.starts_with(&format!("{}: {{", from.name)));

        let line: ChatLine = wire.parse().unwrap();
        assert_eq!(line.sender(), from.name);
        assert_eq!(line.open(&to.private).unwrap(), text);
    }
}

#[test]
fn test_wrong_recipient_cannot_read() {
    let envelope = Envelope::seal("for bob only", &bob().public).unwrap();

    // With no integrity check, a wrong key either fails to decode or yields
    // something other than the original text.
    match envelope.open(&alice().private) {
        Ok(text) => assert_ne!(text, "for bob only"),
        Err(e) => assert!(matches!(
            e,
            CryptoError::Decode(_) | CryptoError::InvalidKeyLength { .. }
        )),
    }
}

#[test]
fn test_large_key_and_long_message() {
    let message = "lorem ipsum dolor sit amet ".repeat(400);
    let envelope = Envelope::seal(&message, &carol().public).unwrap();
    assert_eq!(envelope.encrypted_message.len(), 2 * (8 + message.len()));
    assert_eq!(envelope.open(&carol().private).unwrap(), message);
}

#[test]
fn test_envelope_json_shape() {
    let envelope = Envelope::seal("shape", &alice().public).unwrap();
    let value: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

    let object = value.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object["encrypted_sym_key"].is_string());
    assert!(object["encrypted_message"].is_string());
}

#[test]
fn test_envelope_accepts_odd_length_key_field() {
    let mut envelope = Envelope::seal("odd", &alice().public).unwrap();
    let trimmed = envelope.encrypted_sym_key.trim_start_matches('0').to_string();
    envelope.encrypted_sym_key = trimmed;
    assert_eq!(envelope.open(&alice().private).unwrap(), "odd");
}

#[test]
fn test_tiny_modulus_cannot_wrap_key() {
    let (_, public) = generate_key_pair(&mut OsRng, 128).unwrap();
    let err = Envelope::seal("too small", &public).unwrap_err();
    assert!(matches!(err, CryptoError::MessageTooLarge { .. }));
}

// ============================================================================
// History Replay
// ============================================================================

#[test]
fn test_history_replay_with_foreign_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.txt");

    let mut history = String::new();
    for text in ["first", "second"] {
        history.push_str(&ChatLine::seal("bob", text, &alice().public).unwrap().to_string());
        history.push('\n');
    }
    // A message sealed for someone else and a corrupted line
    history.push_str(&ChatLine::seal("bob", "not yours", &carol().public).unwrap().to_string());
    history.push('\n');
    history.push_str("bob: {\"encrypted_sym_key\": \"zz\"}\n");
    fs::write(&path, history).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let results: Vec<Result<String, CryptoError>> = contents
        .lines()
        .map(|raw| raw.parse::<ChatLine>().and_then(|line| line.open(&alice().private)))
        .collect();

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].as_deref(), Ok("first"));
    assert_eq!(results[1].as_deref(), Ok("second"));
    assert_ne!(results[2].as_deref(), Ok("not yours"));
    assert!(results[3].is_err());
}

#[test]
fn test_textbook_key_interop() {
    // Keys written by other implementations use the same decimal format.
    let private: RsaPrivateKey = "3233,17,2753".parse().unwrap();
    let c = private.public_key().encrypt(b"A").unwrap();
    assert_eq!(c, BigUint::from(2790u32));
    assert_eq!(private.decrypt(&c), b"A".to_vec());
}
