//! Random sources for the engines.
//!
//! With a master seed, each engine gets its own sub-seed derived by hashing
//! the seed together with the engine label, so runs are reproducible and
//! engines never share a stream. Without one, generators come from OS
//! entropy.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Derive the sub-seed for `label` from `master`.
pub fn sub_seed(master: u64, label: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master.to_le_bytes());
    hasher.update(label.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Random source for the engine named `label`.
pub fn engine_rng(master: Option<u64>, label: &str) -> StdRng {
    match master {
        Some(seed) => StdRng::seed_from_u64(sub_seed(seed, label)),
        None => StdRng::from_entropy(),
    }
}
