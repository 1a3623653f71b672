//! Cryptographic error types.

use thiserror::Error;

/// Cryptographic errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    /// Invalid symmetric key length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Accepted length(s)
        expected: &'static str,
        /// Actual length
        actual: usize,
    },

    /// Invalid nonce length
    #[error("invalid nonce length: expected 8, got {actual}")]
    InvalidNonceLength {
        /// Actual length
        actual: usize,
    },

    /// Invalid parameter
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// RSA plaintext integer is not smaller than the modulus
    #[error("message too large for key: {message_bits}-bit message, {modulus_bits}-bit modulus")]
    MessageTooLarge {
        /// Bit length of the plaintext integer
        message_bits: u64,
        /// Bit length of the modulus
        modulus_bits: u64,
    },

    /// Modular inverse does not exist
    #[error("modular inverse does not exist")]
    NoModularInverse,

    /// Malformed serialized key
    #[error("invalid key format: {0}")]
    KeyFormat(String),

    /// Malformed envelope or chat line
    #[error("decode error: {0}")]
    Decode(String),

    /// Random number generation failed
    #[error("random number generation failed")]
    RandomFailed,
}
