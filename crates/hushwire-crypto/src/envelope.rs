//! Hybrid message envelopes.
//!
//! Each message gets a fresh 32-byte key and 8-byte nonce. The text is
//! encrypted with Salsa20 under that key, and the key itself (as lowercase hex
//! text) is wrapped with the recipient's RSA public key.
//!
//! ## Wire Format
//!
//! ```text
//! {
//!   "encrypted_sym_key": hex(RSA(hex(message_key))),
//!   "encrypted_message": hex(nonce (8B) || Salsa20(text))
//! }
//! ```
//!
//! `encrypted_sym_key` is the base-16 rendering of an integer: it has no fixed
//! width and carries no leading zero bytes. Hushwire emits an even number of
//! digits but accepts odd-length input.
//!
//! Envelopes are confidential, not authenticated. Opening a tampered envelope
//! either fails or yields altered text.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::CryptoError;
use crate::random::{random_8, random_32};
use crate::rsa::{RsaPrivateKey, RsaPublicKey};
use crate::salsa20::{NONCE_SIZE, Salsa20};

/// Size of the per-message symmetric key.
pub const MESSAGE_KEY_SIZE: usize = 32;

/// Single-use symmetric key for one envelope.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct MessageKey([u8; MESSAGE_KEY_SIZE]);

impl MessageKey {
    /// Draw a fresh key from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomFailed`] if the OS CSPRNG fails.
    pub fn generate() -> Result<Self, CryptoError> {
        Ok(Self(random_32()?))
    }

    /// Decode a key from its hex text.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decode`] for invalid hex and
    /// [`CryptoError::InvalidKeyLength`] unless it decodes to 32 bytes.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(
            hex::decode(text).map_err(|e| CryptoError::Decode(format!("message key: {e}")))?,
        );
        let key: [u8; MESSAGE_KEY_SIZE] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: "32",
                    actual: bytes.len(),
                })?;
        Ok(Self(key))
    }

    /// Lowercase hex text of the key.
    #[must_use]
    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(self.0))
    }

    /// Raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; MESSAGE_KEY_SIZE] {
        &self.0
    }
}

/// A sealed message: the RSA-wrapped key plus the Salsa20 ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Envelope {
    /// Hex of the RSA ciphertext integer of the message key's hex text
    pub encrypted_sym_key: String,
    /// Hex of `nonce || ciphertext`
    pub encrypted_message: String,
}

impl Envelope {
    /// Seal `message` for the holder of `recipient`'s private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::RandomFailed`] if the OS CSPRNG fails, or
    /// [`CryptoError::MessageTooLarge`] if the recipient's modulus is too
    /// small to wrap the 64 hex digits of the message key.
    pub fn seal(message: &str, recipient: &RsaPublicKey) -> Result<Self, CryptoError> {
        let key = MessageKey::generate()?;
        let nonce = random_8()?;

        let mut payload = Vec::with_capacity(NONCE_SIZE + message.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(message.as_bytes());
        Salsa20::new(key.as_bytes(), &nonce)?.apply_keystream(&mut payload[NONCE_SIZE..]);

        let wrapped = recipient.encrypt(key.to_hex().as_bytes())?;

        tracing::debug!(
            message_len = message.len(),
            modulus_bits = recipient.bits(),
            "sealed envelope"
        );

        Ok(Self {
            encrypted_sym_key: even_hex(&wrapped),
            encrypted_message: hex::encode(payload),
        })
    }

    /// Open the envelope with the recipient's private key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decode`] for malformed hex, a truncated
    /// payload, or plaintext that is not UTF-8 (which is also what a wrong
    /// key usually produces), and [`CryptoError::InvalidKeyLength`] if the
    /// unwrapped key is not 32 bytes.
    pub fn open(&self, private: &RsaPrivateKey) -> Result<String, CryptoError> {
        let wrapped = BigUint::parse_bytes(self.encrypted_sym_key.as_bytes(), 16).ok_or_else(
            || CryptoError::Decode("encrypted_sym_key is not a hex integer".into()),
        )?;
        let key_hex = Zeroizing::new(private.decrypt_to_string(&wrapped)?);
        let key = MessageKey::from_hex(&key_hex)?;

        let payload = hex::decode(&self.encrypted_message)
            .map_err(|e| CryptoError::Decode(format!("encrypted_message: {e}")))?;
        if payload.len() < NONCE_SIZE {
            return Err(CryptoError::Decode(format!(
                "encrypted_message truncated: {} bytes, nonce alone is {NONCE_SIZE}",
                payload.len()
            )));
        }
        let (nonce, ciphertext) = payload.split_at(NONCE_SIZE);

        let plaintext = Salsa20::new(key.as_bytes(), nonce)?.decrypt(ciphertext);

        tracing::debug!(message_len = plaintext.len(), "opened envelope");

        String::from_utf8(plaintext)
            .map_err(|_| CryptoError::Decode("message is not valid UTF-8".into()))
    }

    /// Serialize to the JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, CryptoError> {
        serde_json::to_string(self).map_err(|e| CryptoError::Decode(e.to_string()))
    }

    /// Parse the JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decode`] if the text is not an envelope object.
    pub fn from_json(text: &str) -> Result<Self, CryptoError> {
        serde_json::from_str(text).map_err(|e| CryptoError::Decode(format!("envelope: {e}")))
    }
}

fn even_hex(value: &BigUint) -> String {
    let digits = value.to_str_radix(16);
    if digits.len() % 2 == 0 {
        digits
    } else {
        format!("0{digits}")
    }
}
