//! KVT - Store Fingerprint Hasher
//! 64-bit FNV-1a, used to fingerprint a store's (key, timestamp) pairs.
//!
//! Not cryptographic: it only detects divergence between two stores.

use std::hash::Hasher;

const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const PRIME: u64 = 0x100000001b3;

/// Streaming FNV-1a 64-bit hasher.
#[derive(Debug, Clone, Copy)]
pub struct Fnv64a {
    state: u64,
}

impl Fnv64a {
    pub fn new() -> Self {
        Self {
            state: OFFSET_BASIS,
        }
    }

    /// Render the current state as 16 lowercase hex digits.
    pub fn hex(&self) -> String {
        format!("{:016x}", self.state)
    }
}

impl Default for Fnv64a {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv64a {
    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(PRIME);
        }
    }

    fn finish(&self) -> u64 {
        self.state
    }
}
