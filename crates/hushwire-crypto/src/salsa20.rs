//! Salsa20 stream cipher.
//!
//! The 64-byte state is a 4×4 matrix of little-endian 32-bit words:
//!
//! ```text
//! +------+------+------+------+
//! |  c0  |  k0  |  k1  |  k2  |
//! |  k3  |  c1  |  n0  |  n1  |
//! |  t0  |  t1  |  c2  |  k4  |
//! |  k5  |  k6  |  k7  |  c3  |
//! +------+------+------+------+
//! ```
//!
//! `c` are the constants, `k` the key words (a 16-byte key fills `k4..k7`
//! with a second copy of `k0..k3`), `n` the nonce and `t` the 64-bit block
//! counter.
//!
//! The cipher provides confidentiality only. There is no authentication tag;
//! flipped ciphertext bits flip the same plaintext bits.

use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::CryptoError;

/// Output size of one block function call.
pub const BLOCK_SIZE: usize = 64;

/// Salsa20 nonce size.
pub const NONCE_SIZE: usize = 8;

/// Full-strength round count.
pub const DEFAULT_ROUNDS: u32 = 20;

const SIGMA: &[u8; 16] = b"expand 32-byte k";
const TAU: &[u8; 16] = b"expand 16-byte k";

/// Salsa20 quarter-round on four words.
#[inline]
#[must_use]
pub fn quarter_round(a: u32, b: u32, c: u32, d: u32) -> (u32, u32, u32, u32) {
    let b = b ^ a.wrapping_add(d).rotate_left(7);
    let c = c ^ b.wrapping_add(a).rotate_left(9);
    let d = d ^ c.wrapping_add(b).rotate_left(13);
    let a = a ^ d.wrapping_add(c).rotate_left(18);
    (a, b, c, d)
}

#[inline]
fn quarter_round_at(x: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    (x[a], x[b], x[c], x[d]) = quarter_round(x[a], x[b], x[c], x[d]);
}

fn double_round(x: &mut [u32; 16]) {
    // columns
    quarter_round_at(x, 0, 4, 8, 12);
    quarter_round_at(x, 5, 9, 13, 1);
    quarter_round_at(x, 10, 14, 2, 6);
    quarter_round_at(x, 15, 3, 7, 11);
    // rows
    quarter_round_at(x, 0, 1, 2, 3);
    quarter_round_at(x, 5, 6, 7, 4);
    quarter_round_at(x, 10, 11, 8, 9);
    quarter_round_at(x, 15, 12, 13, 14);
}

fn words<const N: usize>(bytes: &[u8]) -> [u32; N] {
    let mut out = [0u32; N];
    for (word, chunk) in out.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}

/// Salsa20 keystream generator.
///
/// The block counter starts at 0 and advances by one for every 64-byte block
/// produced. It persists across [`Salsa20::keystream`] calls on the same
/// instance; the unused tail of a partially consumed block is discarded.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Salsa20 {
    constants: [u32; 4],
    key: [u32; 8],
    nonce: [u32; 2],
    counter: u64,
    rounds: u32,
}

impl Salsa20 {
    /// Create a 20-round cipher.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKeyLength`] unless the key is 16 or 32
    /// bytes, and [`CryptoError::InvalidNonceLength`] unless the nonce is 8
    /// bytes.
    pub fn new(key: &[u8], nonce: &[u8]) -> Result<Self, CryptoError> {
        Self::with_rounds(key, nonce, DEFAULT_ROUNDS)
    }

    /// Create a cipher with a reduced round count (e.g. Salsa20/8, Salsa20/12).
    ///
    /// # Errors
    ///
    /// As [`Salsa20::new`], plus [`CryptoError::InvalidParameter`] if `rounds`
    /// is zero or odd.
    pub fn with_rounds(key: &[u8], nonce: &[u8], rounds: u32) -> Result<Self, CryptoError> {
        let (constants, key) = match key.len() {
            32 => (words::<4>(SIGMA), words::<8>(key)),
            16 => {
                let half = words::<4>(key);
                let mut expanded = [0u32; 8];
                expanded[..4].copy_from_slice(&half);
                expanded[4..].copy_from_slice(&half);
                (words::<4>(TAU), expanded)
            }
            actual => {
                return Err(CryptoError::InvalidKeyLength {
                    expected: "16 or 32",
                    actual,
                });
            }
        };

        if nonce.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                actual: nonce.len(),
            });
        }

        if rounds == 0 || rounds % 2 != 0 {
            return Err(CryptoError::InvalidParameter(format!(
                "round count must be even and non-zero, got {rounds}"
            )));
        }

        Ok(Self {
            constants,
            key,
            nonce: words::<2>(nonce),
            counter: 0,
            rounds,
        })
    }

    /// Current block counter.
    #[must_use]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Reposition the block counter.
    pub fn seek(&mut self, counter: u64) {
        self.counter = counter;
    }

    fn initial_state(&self, counter: u64) -> [u32; 16] {
        let [c0, c1, c2, c3] = self.constants;
        let k = &self.key;
        let [n0, n1] = self.nonce;
        [
            c0,
            k[0],
            k[1],
            k[2],
            k[3],
            c1,
            n0,
            n1,
            counter as u32,
            (counter >> 32) as u32,
            c2,
            k[4],
            k[5],
            k[6],
            k[7],
            c3,
        ]
    }

    /// Compute the keystream block for `counter` without touching the
    /// instance's own counter.
    #[must_use]
    pub fn block(&self, counter: u64) -> [u8; BLOCK_SIZE] {
        let mut input = self.initial_state(counter);
        let mut x = input;
        for _ in 0..self.rounds / 2 {
            double_round(&mut x);
        }

        let mut out = [0u8; BLOCK_SIZE];
        for ((chunk, mixed), original) in out.chunks_exact_mut(4).zip(&x).zip(&input) {
            chunk.copy_from_slice(&mixed.wrapping_add(*original).to_le_bytes());
        }

        input.zeroize();
        x.zeroize();
        out
    }

    /// Produce exactly `len` keystream bytes, advancing the counter by the
    /// number of blocks consumed.
    pub fn keystream(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE);
        while out.len() < len {
            let mut block = self.block(self.counter);
            out.extend_from_slice(&block);
            block.zeroize();
            self.counter = self.counter.wrapping_add(1);
        }
        out.truncate(len);
        out
    }

    /// XOR `buf` in place with the next `buf.len()` keystream bytes.
    pub fn apply_keystream(&mut self, buf: &mut [u8]) {
        let mut keystream = self.keystream(buf.len());
        for (byte, k) in buf.iter_mut().zip(&keystream) {
            *byte ^= k;
        }
        keystream.zeroize();
    }

    /// Encrypt `data`.
    #[must_use]
    pub fn encrypt(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = data.to_vec();
        self.apply_keystream(&mut out);
        out
    }

    /// Decrypt `data`. Identical to [`Salsa20::encrypt`].
    #[must_use]
    pub fn decrypt(&mut self, data: &[u8]) -> Vec<u8> {
        self.encrypt(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x42; 32];
    const NONCE: [u8; 8] = [0x24; 8];

    #[test]
    fn test_quarter_round_zero_is_fixed_point() {
        assert_eq!(quarter_round(0, 0, 0, 0), (0, 0, 0, 0));
    }

    #[test]
    fn test_quarter_round_unit() {
        assert_eq!(
            quarter_round(0x0000_0001, 0, 0, 0),
            (0x0800_8145, 0x0000_0080, 0x0001_0200, 0x2050_0000)
        );
    }

    #[test]
    fn test_rejects_bad_key_length() {
        for len in [0usize, 15, 24, 31, 33, 64] {
            let key = vec![0u8; len];
            assert_eq!(
                Salsa20::new(&key, &NONCE).err(),
                Some(CryptoError::InvalidKeyLength {
                    expected: "16 or 32",
                    actual: len
                })
            );
        }
    }

    #[test]
    fn test_rejects_bad_nonce_length() {
        for len in [0usize, 7, 9, 12, 24] {
            let nonce = vec![0u8; len];
            assert_eq!(
                Salsa20::new(&KEY, &nonce).err(),
                Some(CryptoError::InvalidNonceLength { actual: len })
            );
        }
    }

    #[test]
    fn test_rejects_bad_rounds() {
        assert!(Salsa20::with_rounds(&KEY, &NONCE, 0).is_err());
        assert!(Salsa20::with_rounds(&KEY, &NONCE, 7).is_err());
        assert!(Salsa20::with_rounds(&KEY, &NONCE, 8).is_ok());
    }

    #[test]
    fn test_encrypt_decrypt_fresh_instances() {
        let plaintext = b"attack at dawn, bring snacks".to_vec();

        let ciphertext = Salsa20::new(&KEY, &NONCE).unwrap().encrypt(&plaintext);
        assert_ne!(ciphertext, plaintext);

        let decrypted = Salsa20::new(&KEY, &NONCE).unwrap().decrypt(&ciphertext);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_sixteen_byte_key_roundtrip() {
        let key = [0x07u8; 16];
        let plaintext = vec![0xAB; 200];
        let ciphertext = Salsa20::new(&key, &NONCE).unwrap().encrypt(&plaintext);
        let decrypted = Salsa20::new(&key, &NONCE).unwrap().decrypt(&ciphertext);
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_counter_advances_per_block() {
        let mut cipher = Salsa20::new(&KEY, &NONCE).unwrap();
        assert_eq!(cipher.counter(), 0);

        let _ = cipher.keystream(1);
        assert_eq!(cipher.counter(), 1);

        let _ = cipher.keystream(64);
        assert_eq!(cipher.counter(), 2);

        let _ = cipher.keystream(65);
        assert_eq!(cipher.counter(), 4);

        let _ = cipher.keystream(0);
        assert_eq!(cipher.counter(), 4);
    }

    #[test]
    fn test_keystream_discards_partial_block_tail() {
        let mut cipher = Salsa20::new(&KEY, &NONCE).unwrap();
        let first = cipher.keystream(10);
        let second = cipher.keystream(10);

        let reference = Salsa20::new(&KEY, &NONCE).unwrap();
        assert_eq!(first, reference.block(0)[..10]);
        assert_eq!(second, reference.block(1)[..10]);
    }

    #[test]
    fn test_keystream_matches_blocks() {
        let mut cipher = Salsa20::new(&KEY, &NONCE).unwrap();
        let stream = cipher.keystream(3 * BLOCK_SIZE);
        for i in 0..3 {
            assert_eq!(
                stream[i * BLOCK_SIZE..(i + 1) * BLOCK_SIZE],
                cipher.block(i as u64)
            );
        }
    }

    #[test]
    fn test_seek() {
        let mut cipher = Salsa20::new(&KEY, &NONCE).unwrap();
        cipher.seek(5);
        assert_eq!(cipher.keystream(BLOCK_SIZE), cipher.block(5));
        assert_eq!(cipher.counter(), 6);
    }

    #[test]
    fn test_block_is_deterministic() {
        let a = Salsa20::new(&KEY, &NONCE).unwrap();
        let b = Salsa20::new(&KEY, &NONCE).unwrap();
        assert_eq!(a.block(7), b.block(7));
        assert_ne!(a.block(7), a.block(8));
    }

    #[test]
    fn test_counter_high_word_used() {
        let cipher = Salsa20::new(&KEY, &NONCE).unwrap();
        assert_ne!(cipher.block(1), cipher.block(1 << 32));
    }

    #[test]
    fn test_reduced_rounds_differ() {
        let full = Salsa20::new(&KEY, &NONCE).unwrap();
        let reduced = Salsa20::with_rounds(&KEY, &NONCE, 8).unwrap();
        assert_ne!(full.block(0), reduced.block(0));
    }

    #[test]
    fn test_empty_input() {
        let mut cipher = Salsa20::new(&KEY, &NONCE).unwrap();
        assert!(cipher.encrypt(&[]).is_empty());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Whole-block chunks produce the same stream as one call
            #[test]
            fn keystream_chunked_by_blocks(blocks in prop::collection::vec(0usize..4, 1..6)) {
                let total: usize = blocks.iter().sum::<usize>() * BLOCK_SIZE;
                let whole = Salsa20::new(&KEY, &NONCE).unwrap().keystream(total);

                let mut cipher = Salsa20::new(&KEY, &NONCE).unwrap();
                let mut chunked = Vec::with_capacity(total);
                for n in &blocks {
                    chunked.extend(cipher.keystream(n * BLOCK_SIZE));
                }
                prop_assert_eq!(chunked, whole);
            }

            /// `block(i)` is the i-th slice of the stream
            #[test]
            fn block_matches_stream_offset(index in 0u64..8) {
                let mut cipher = Salsa20::new(&KEY, &NONCE).unwrap();
                let stream = cipher.keystream(8 * BLOCK_SIZE);
                let start = index as usize * BLOCK_SIZE;
                prop_assert_eq!(&stream[start..start + BLOCK_SIZE], &cipher.block(index)[..]);
            }
        }
    }
}
