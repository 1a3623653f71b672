//! # Hushwire Crypto
//!
//! End-to-end message confidentiality for Hushwire chat, built from first
//! principles.
//!
//! This crate provides:
//! - Miller–Rabin primality testing and prime generation
//! - Textbook RSA key generation, encryption and decryption
//! - The Salsa20 stream cipher
//! - Hybrid envelopes: a per-message Salsa20 key wrapped with RSA
//! - Chat-line framing for envelopes
//!
//! ## Cryptographic Suite
//!
//! | Function | Algorithm | Notes |
//! |----------|-----------|-------|
//! | Key Transport | RSA, e = 65537 | No padding, deterministic |
//! | Bulk Cipher | Salsa20/20 | 256-bit key, 64-bit nonce |
//! | Primality | Miller–Rabin, k = 5 | Trial division pre-filter |
//! | Randomness | OS CSPRNG | `getrandom` / `OsRng` |
//!
//! ## Limitations
//!
//! Confidentiality only. There is no MAC, no forward secrecy and no
//! constant-time arithmetic, and the envelope format is not compatible with
//! any standard (RSA-OAEP, NaCl box, ...).
//!
//! ## Usage
//!
//! ```no_run
//! use hushwire_crypto::{Envelope, rsa::generate_key_pair};
//! use rand_core::OsRng;
//!
//! let (private, public) = generate_key_pair(&mut OsRng, 512)?;
//! let envelope = Envelope::seal("hello", &public)?;
//! assert_eq!(envelope.open(&private)?, "hello");
//! # Ok::<(), hushwire_crypto::CryptoError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod envelope;
pub mod error;
pub mod prime;
pub mod random;
pub mod rsa;
pub mod salsa20;
pub mod wire;

pub use envelope::{Envelope, MessageKey};
pub use error::CryptoError;
pub use rsa::{RsaPrivateKey, RsaPublicKey, generate_key_pair};
pub use salsa20::Salsa20;
pub use wire::ChatLine;
