//! State Hashing
//!
//! SHA-256 fingerprints of match state. Used to:
//! - prove that a rejected move left the match untouched
//! - compare a replayed match against the recorded one
//! - fingerprint captured frames in logs

use sha2::{Sha256, Digest};

/// 32-byte SHA-256 digest.
pub type StateHash = [u8; 32];

/// Incremental, order-sensitive hasher over primitive fields.
///
/// Integers are fed little-endian; optionals carry a presence byte so
/// `None` and `Some(0)` never collide.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Start a hash under a domain tag.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Hasher tagged for `MatchState`.
    pub fn for_match_state() -> Self {
        Self::new(b"RETRO_RUMBLE_STATE_V1")
    }

    /// Feed raw bytes.
    #[inline]
    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Feed one byte.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Feed a `u32`.
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Feed a `u64`.
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Feed a flag as one byte.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(u8::from(value));
    }

    /// Feed an optional byte: `0` for `None`, `1, v` for `Some(v)`.
    #[inline]
    pub fn update_opt_u8(&mut self, value: Option<u8>) {
        match value {
            Some(v) => {
                self.update_u8(1);
                self.update_u8(v);
            }
            None => self.update_u8(0),
        }
    }

    /// Consume the hasher.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Plain SHA-256 of a byte slice (frame fingerprints).
pub fn hash_bytes(data: &[u8]) -> StateHash {
    Sha256::digest(data).into()
}

/// Hash a match: round number and clock first, then whatever `add_state`
/// feeds. `MatchState::compute_hash` is the only caller in the crate.
pub fn compute_state_hash<F>(round_number: u32, clock_remaining: u32, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut state_hasher = StateHasher::for_match_state();
    state_hasher.update_u32(round_number);
    state_hasher.update_u32(clock_remaining);
    add_state(&mut state_hasher);
    state_hasher.finalize()
}
