//! Opponent Randomness
//!
//! Xorshift128+ seeded through SplitMix64. A match seeded the same way
//! draws the same opponent moves everywhere, so replays and tests are
//! reproducible.

use serde::{Serialize, Deserialize};
use sha2::{Sha256, Digest};

/// Seeded Xorshift128+ generator.
///
/// # Example
///
/// ```
/// use retro_rumble::core::rng::DeterministicRng;
///
/// let mut left = DeterministicRng::new(7);
/// let mut right = DeterministicRng::new(7);
/// assert_eq!(left.next_int(5), right.next_int(5));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeterministicRng {
    state: [u64; 2],
}

impl Default for DeterministicRng {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicRng {
    /// Seed a generator. Both state words come from SplitMix64, so small
    /// or sequential seeds still start far apart.
    pub fn new(seed: u64) -> Self {
        let mut cursor = seed;
        let hi = splitmix64(&mut cursor);
        let lo = splitmix64(&mut cursor);

        // Xorshift never leaves the all-zero state
        if hi == 0 && lo == 0 {
            return Self { state: [1, 1] };
        }
        Self { state: [hi, lo] }
    }

    /// Next raw 64-bit output.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let [a, mut b] = self.state;
        let out = a.wrapping_add(b);

        b ^= a;
        self.state = [a.rotate_left(24) ^ b ^ (b << 16), b.rotate_left(37)];
        out
    }

    /// Uniform integer in `0..max`. Returns 0 when `max <= 1`.
    ///
    /// Draws above the largest multiple of `max` are discarded, so no
    /// value is favoured by the modulo.
    pub fn next_int(&mut self, max: u32) -> u32 {
        if max <= 1 {
            return 0;
        }
        let span = u64::from(max);
        let limit = u64::MAX - (u64::MAX % span);
        loop {
            let draw = self.next_u64();
            if draw < limit {
                return (draw % span) as u32;
            }
        }
    }

    /// Raw generator state, hashed into the match state.
    pub fn state(&self) -> [u64; 2] {
        self.state
    }

    /// Rewind to a state previously read with [`state`](Self::state).
    pub fn set_state(&mut self, state: [u64; 2]) {
        self.state = state;
    }
}

#[inline]
fn splitmix64(cursor: &mut u64) -> u64 {
    *cursor = cursor.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *cursor;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Seed for a match from its UUID bytes and extra entropy.
///
/// Pure function of its inputs: keeping `(match_id, entropy)` is enough to
/// reproduce every opponent draw of that match.
pub fn derive_match_seed(match_id: &[u8; 16], entropy: &[u8]) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(b"RETRO_RUMBLE_SEED_V1");
    hasher.update(match_id);
    hasher.update(entropy);
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

// =============================================================================
// TESTS
// =============================================================================
