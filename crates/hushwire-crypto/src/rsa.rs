//! Textbook RSA over arbitrary-precision integers.
//!
//! ## Security Properties
//!
//! **None beyond the bare trapdoor.** No padding scheme (OAEP, PKCS#1 v1.5)
//! is applied: encryption is deterministic for a given `(m, e, n)` and the
//! ciphertext is malleable. Hushwire only ever encrypts a freshly drawn,
//! single-use symmetric key with it, and the wire format depends on the
//! unpadded integer, so padding cannot be added without breaking existing
//! envelopes.
//!
//! ## Key Strings
//!
//! ```text
//! public:  <n>,<e>
//! private: <n>,<e>,<d>
//! ```
//!
//! All fields are decimal integers.

use std::fmt;
use std::str::FromStr;

use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand_core::{CryptoRng, RngCore};

use crate::CryptoError;
use crate::prime::generate_prime;

/// Preferred public exponent.
pub const DEFAULT_PUBLIC_EXPONENT: u32 = 65_537;

/// Default modulus width used when provisioning an account.
pub const DEFAULT_MODULUS_BITS: u64 = 512;

/// Smallest modulus width accepted by [`generate_key_pair`].
pub const MIN_MODULUS_BITS: u64 = 16;

/// RSA public key `(n, e)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
}

/// RSA private key `(n, e, d)`.
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivateKey {
    n: BigUint,
    e: BigUint,
    d: BigUint,
}

impl RsaPublicKey {
    /// Build a public key from its modulus and exponent.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyFormat`] if the modulus is not greater than 1.
    pub fn new(n: BigUint, e: BigUint) -> Result<Self, CryptoError> {
        check_modulus(&n)?;
        Ok(Self { n, e })
    }

    /// The modulus `n`.
    #[must_use]
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// The public exponent `e`.
    #[must_use]
    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// Bit length of the modulus.
    #[must_use]
    pub fn bits(&self) -> u64 {
        self.n.bits()
    }

    /// Longest byte string guaranteed to be encryptable under this key.
    #[must_use]
    pub fn max_message_len(&self) -> usize {
        ((self.n.bits() - 1) / 8) as usize
    }

    /// Encrypt a byte string read as a big-endian integer `m`: `c = m^e mod n`.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::MessageTooLarge`] if `m >= n`. Nothing is
    /// chunked; callers must keep messages below the modulus.
    pub fn encrypt(&self, message: &[u8]) -> Result<BigUint, CryptoError> {
        let m = BigUint::from_bytes_be(message);
        if m >= self.n {
            return Err(CryptoError::MessageTooLarge {
                message_bits: m.bits(),
                modulus_bits: self.n.bits(),
            });
        }
        Ok(m.modpow(&self.e, &self.n))
    }
}

impl RsaPrivateKey {
    /// Build a private key from its modulus, public exponent and private exponent.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::KeyFormat`] if the modulus is not greater than 1.
    pub fn new(n: BigUint, e: BigUint, d: BigUint) -> Result<Self, CryptoError> {
        check_modulus(&n)?;
        Ok(Self { n, e, d })
    }

    /// Derive the shareable half of this key.
    #[must_use]
    pub fn public_key(&self) -> RsaPublicKey {
        RsaPublicKey {
            n: self.n.clone(),
            e: self.e.clone(),
        }
    }

    /// The modulus `n`.
    #[must_use]
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// Bit length of the modulus.
    #[must_use]
    pub fn bits(&self) -> u64 {
        self.n.bits()
    }

    /// Decrypt `c` to the minimal big-endian encoding of `m = c^d mod n`.
    ///
    /// Leading zero bytes of the original plaintext are not recoverable, and
    /// `m = 0` yields an empty vector.
    #[must_use]
    pub fn decrypt(&self, ciphertext: &BigUint) -> Vec<u8> {
        let m = ciphertext.modpow(&self.d, &self.n);
        if m.is_zero() {
            return Vec::new();
        }
        m.to_bytes_be()
    }

    /// Decrypt `c` and decode the plaintext as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Decode`] if the plaintext is not valid UTF-8.
    pub fn decrypt_to_string(&self, ciphertext: &BigUint) -> Result<String, CryptoError> {
        String::from_utf8(self.decrypt(ciphertext))
            .map_err(|_| CryptoError::Decode("RSA plaintext is not valid UTF-8".into()))
    }
}

impl fmt::Debug for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateKey")
            .field("n", &self.n)
            .field("e", &self.e)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RsaPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.n, self.e)
    }
}

impl fmt::Display for RsaPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.n, self.e, self.d)
    }
}

impl FromStr for RsaPublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [n, e] = parse_fields::<2>(s, "public")?;
        Self::new(n, e)
    }
}

impl FromStr for RsaPrivateKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let [n, e, d] = parse_fields::<3>(s, "private")?;
        Self::new(n, e, d)
    }
}

fn check_modulus(n: &BigUint) -> Result<(), CryptoError> {
    if *n <= BigUint::one() {
        return Err(CryptoError::KeyFormat(
            "modulus must be greater than 1".into(),
        ));
    }
    Ok(())
}

fn parse_fields<const N: usize>(s: &str, kind: &str) -> Result<[BigUint; N], CryptoError> {
    let fields: Vec<&str> = s.trim().split(',').collect();
    if fields.len() != N {
        return Err(CryptoError::KeyFormat(format!(
            "{kind} key needs {N} comma-separated fields, got {}",
            fields.len()
        )));
    }

    let values = fields
        .iter()
        .map(|field| {
            field.trim().parse::<BigUint>().map_err(|e| {
                CryptoError::KeyFormat(format!("{kind} key field {field:?}: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    values
        .try_into()
        .map_err(|_| CryptoError::KeyFormat(format!("{kind} key field count mismatch")))
}

/// Modular inverse `x` with `a·x ≡ 1 (mod m)`, by the iterative extended
/// Euclidean algorithm.
///
/// # Errors
///
/// Returns [`CryptoError::NoModularInverse`] if `gcd(a, m) != 1` or `m = 0`.
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Result<BigUint, CryptoError> {
    if m.is_zero() {
        return Err(CryptoError::NoModularInverse);
    }

    let modulus = BigInt::from(m.clone());
    let (mut old_r, mut r) = (BigInt::from(a.clone()), modulus.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);
        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);
    }

    if !old_r.is_one() {
        return Err(CryptoError::NoModularInverse);
    }

    old_s
        .mod_floor(&modulus)
        .to_biguint()
        .ok_or(CryptoError::NoModularInverse)
}

/// Pick the public exponent for a totient: 65537 when coprime with `phi`,
/// otherwise the smallest odd integer from 3 upwards that is.
#[must_use]
pub fn select_public_exponent(phi: &BigUint) -> BigUint {
    let preferred = BigUint::from(DEFAULT_PUBLIC_EXPONENT);
    if preferred.gcd(phi).is_one() {
        return preferred;
    }

    let mut e = BigUint::from(3u32);
    while !e.gcd(phi).is_one() {
        e += 2u32;
    }
    e
}

/// Generate an RSA key pair whose modulus has exactly `bit_length` bits.
///
/// Returns `(private, public)`.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParameter`] if `bit_length` is below
/// [`MIN_MODULUS_BITS`], or [`CryptoError::NoModularInverse`] if the
/// exponent selection invariant is ever broken.
pub fn generate_key_pair<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bit_length: u64,
) -> Result<(RsaPrivateKey, RsaPublicKey), CryptoError> {
    if bit_length < MIN_MODULUS_BITS {
        return Err(CryptoError::InvalidParameter(format!(
            "modulus must be at least {MIN_MODULUS_BITS} bits, got {bit_length}"
        )));
    }

    let p_bits = bit_length / 2;
    let q_bits = bit_length - p_bits;

    let (p, q) = loop {
        let p = generate_prime(rng, p_bits)?;
        let mut q = generate_prime(rng, q_bits)?;
        while q == p {
            q = generate_prime(rng, q_bits)?;
        }
        if (&p * &q).bits() == bit_length {
            break (p, q);
        }
        tracing::trace!(bit_length, "modulus one bit short, redrawing primes");
    };

    let n = &p * &q;
    let phi = (&p - BigUint::one()) * (&q - BigUint::one());
    let e = select_public_exponent(&phi);
    let d = mod_inverse(&e, &phi)?;

    tracing::debug!(bit_length, exponent = %e, "generated RSA key pair");

    let public = RsaPublicKey {
        n: n.clone(),
        e: e.clone(),
    };
    Ok((RsaPrivateKey { n, e, d }, public))
}
