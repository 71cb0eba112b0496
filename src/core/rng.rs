//! Secret Number Generator
//!
//! Uses Xorshift128+ for fast, reproducible secret draws.
//! Given the same seed, produces identical secrets on all platforms, which
//! keeps game scenarios replayable in tests.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Seeded PRNG using the Xorshift128+ algorithm.
///
/// # Example
///
/// ```
/// use glitchy_guesser::core::rng::SecretRng;
///
/// let mut a = SecretRng::new(12345);
/// let mut b = SecretRng::new(12345);
/// assert_eq!(a.next_in_range(1, 100), b.next_in_range(1, 100));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SecretRng {
    state: [u64; 2],
}

impl Default for SecretRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SecretRng {
    /// Create a new RNG from a 64-bit seed.
    ///
    /// Uses SplitMix64 to initialize the internal state, ensuring
    /// good distribution even from weak seeds.
    pub fn new(seed: u64) -> Self {
        let mut s = seed;
        let state0 = splitmix64(&mut s);
        let state1 = splitmix64(&mut s);

        // Xorshift must never run from an all-zero state
        let state = if state0 == 0 && state1 == 0 {
            [1, 1]
        } else {
            [state0, state1]
        };

        Self { state }
    }

    /// Create an RNG for a player session.
    ///
    /// The seed mixes the session id with caller-supplied entropy so two
    /// sessions opened in the same instant still draw different secrets.
    pub fn for_session(session_id: &[u8; 16], entropy: u64) -> Self {
        Self::new(derive_session_seed(session_id, entropy))
    }

    /// Generate the next 64-bit random value.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        self.state[1] = s1.rotate_left(37);

        result
    }

    /// Generate a random integer in range [0, max).
    #[inline]
    pub fn next_below(&mut self, max: u64) -> u64 {
        if max == 0 {
            return 0;
        }
        // Modulo bias is negligible for guessing-game ranges
        self.next_u64() % max
    }

    /// Generate a random integer in the inclusive range [low, high].
    #[inline]
    pub fn next_in_range(&mut self, low: i64, high: i64) -> i64 {
        if low >= high {
            return low;
        }
        let span = high.abs_diff(low).saturating_add(1);
        low.wrapping_add(self.next_below(span) as i64)
    }
}

/// SplitMix64 for seed initialization.
#[inline]
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Derive a session seed from the session id and entropy.
pub fn derive_session_seed(session_id: &[u8; 16], entropy: u64) -> u64 {
    let mut hasher = Sha256::new();

    // Domain separator
    hasher.update(b"GLITCHY_GUESSER_SEED_V1");
    hasher.update(session_id);
    hasher.update(entropy.to_le_bytes());

    let hash = hasher.finalize();

    let mut seed = [0u8; 8];
    seed.copy_from_slice(&hash[..8]);
    u64::from_le_bytes(seed)
}
