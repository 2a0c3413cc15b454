//! Content hashing for fingerprint digests.
//!
//! Small spans are hashed with xxh3, large spans with BLAKE3 truncated to 64
//! bits. Both are keyed with a seed drawn once per process. The crossover
//! point depends on the target CPU family; it only affects speed, never the
//! verdict of a comparison within one process.

use std::sync::OnceLock;

use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

/// Hash function chosen for a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Xxh3,
    Blake3,
}

struct Thresholds {
    /// Spans of at least this many bytes go to BLAKE3.
    blake3_from: usize,
}

// BLAKE3 has wide SIMD kernels on x86_64 and NEON on aarch64; elsewhere it
// falls back to portable code and wins later.
#[cfg(target_arch = "x86_64")]
const THRESHOLDS: Thresholds = Thresholds { blake3_from: 16 * 1024 };

#[cfg(target_arch = "aarch64")]
const THRESHOLDS: Thresholds = Thresholds { blake3_from: 4 * 1024 };

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
const THRESHOLDS: Thresholds = Thresholds { blake3_from: 64 * 1024 };

const KEY_CONTEXT: &str = "immcheck 2024 fingerprint digest key";

fn seed() -> u64 {
    static SEED: OnceLock<u64> = OnceLock::new();
    *SEED.get_or_init(rand::random::<u64>)
}

fn blake3_key() -> &'static [u8; 32] {
    static KEY: OnceLock<[u8; 32]> = OnceLock::new();
    KEY.get_or_init(|| blake3::derive_key(KEY_CONTEXT, &seed().to_le_bytes()))
}

/// Chooses and applies the content hash for a byte span.
pub struct HashSelector;

impl HashSelector {
    /// Pick the algorithm for a span of `len` bytes.
    pub const fn select(len: usize) -> HashAlgorithm {
        if len >= THRESHOLDS.blake3_from {
            HashAlgorithm::Blake3
        } else {
            HashAlgorithm::Xxh3
        }
    }

    /// Hash `bytes` with the algorithm selected for its length.
    pub fn hash(bytes: &[u8]) -> u64 {
        match Self::select(bytes.len()) {
            HashAlgorithm::Xxh3 => xxh3_64_with_seed(bytes, seed()),
            HashAlgorithm::Blake3 => {
                let hash = blake3::keyed_hash(blake3_key(), bytes);
                let mut prefix = [0u8; 8];
                prefix.copy_from_slice(&hash.as_bytes()[..8]);
                u64::from_le_bytes(prefix)
            }
        }
    }
}

/// Unseeded tag for a static type name, stable for the life of the process.
pub(crate) fn type_tag(name: &str) -> u64 {
    xxh3_64(name.as_bytes())
}
