//! Probabilistic primality testing and prime generation.
//!
//! Candidates are filtered by trial division against the primes below 30,
//! then certified with Miller–Rabin using random witnesses. With
//! [`MILLER_RABIN_ROUNDS`] witnesses a composite slips through with
//! probability at most `4^-5` per candidate.

use num_bigint::{BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::One;
use rand_core::{CryptoRng, RngCore};

use crate::CryptoError;

/// Primes used for the trial-division pre-filter.
pub const SMALL_PRIMES: [u32; 10] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29];

/// Number of random Miller–Rabin witnesses per candidate.
pub const MILLER_RABIN_ROUNDS: usize = 5;

/// Test `n` for primality with [`MILLER_RABIN_ROUNDS`] random witnesses.
///
/// Returns `false` for `n < 2`. A `true` result is probabilistic.
pub fn is_probable_prime<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, n: &BigUint) -> bool {
    miller_rabin(rng, n, MILLER_RABIN_ROUNDS)
}

/// Miller–Rabin test with an explicit number of witness rounds.
pub fn miller_rabin<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    n: &BigUint,
    rounds: usize,
) -> bool {
    let two = BigUint::from(2u32);
    if *n < two {
        return false;
    }

    for &small in &SMALL_PRIMES {
        let small = BigUint::from(small);
        if n.is_multiple_of(&small) {
            return *n == small;
        }
    }

    // n - 1 = d * 2^s with d odd
    let n_minus_one = n - BigUint::one();
    let s = n_minus_one.trailing_zeros().unwrap_or(0);
    let d = &n_minus_one >> s;

    'witness: for _ in 0..rounds {
        // a in [2, n - 2]
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, n);

        if x.is_one() || x == n_minus_one {
            continue;
        }

        for _ in 1..s {
            x = (&x * &x) % n;
            if x == n_minus_one {
                continue 'witness;
            }
        }

        return false;
    }

    true
}

/// Draw a random odd integer of exactly `bit_length` bits.
///
/// The top bit is forced so the width is exact; the bottom bit is forced so
/// the candidate is odd.
pub fn prime_candidate<R: RngCore + CryptoRng + ?Sized>(rng: &mut R, bit_length: u64) -> BigUint {
    let mut candidate = rng.gen_biguint(bit_length);
    candidate |= BigUint::one() << (bit_length - 1);
    candidate |= BigUint::one();
    candidate
}

/// Generate a probable prime of exactly `bit_length` bits.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidParameter`] if `bit_length < 2`.
pub fn generate_prime<R: RngCore + CryptoRng + ?Sized>(
    rng: &mut R,
    bit_length: u64,
) -> Result<BigUint, CryptoError> {
    if bit_length < 2 {
        return Err(CryptoError::InvalidParameter(format!(
            "prime bit length must be at least 2, got {bit_length}"
        )));
    }

    let mut attempts: u64 = 0;
    loop {
        attempts += 1;
        let candidate = prime_candidate(rng, bit_length);
        if is_probable_prime(rng, &candidate) {
            tracing::trace!(bit_length, attempts, "found probable prime");
            return Ok(candidate);
        }
    }
}
