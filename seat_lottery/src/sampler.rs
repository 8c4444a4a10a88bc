//! Reproducible shuffles.
//!
//! Every shuffle gets its own generator, derived from the run seed and a
//! salt naming what is being shuffled (a category, or a group and a
//! category). Two shuffles never share a stream, so the order in which the
//! categories or the groups are processed has no influence on the draws.
//!
//! The derivation is `sha256("{seed}|{salt}")`, whose 32 bytes seed a
//! ChaCha20 stream. Ranges are drawn by rejection sampling and the
//! permutation is a Fisher–Yates shuffle, so the outcome only depends on the
//! input order, the seed and the salt, on every platform.

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};
use snafu::prelude::*;

use crate::config::*;

/// The salt for a category, optionally qualified by the group it belongs to.
pub fn category_salt(group: Option<&str>, category: Category) -> String {
    match group {
        Some(g) => format!("{}|{}", g, category.label()),
        None => category.label().to_string(),
    }
}

/// A seeded generator dedicated to one shuffle.
#[derive(Debug, Clone)]
pub struct SaltedRng {
    rng: ChaCha20Rng,
}

impl SaltedRng {
    pub fn new(seed: u64, salt: &str) -> LotteryResult<SaltedRng> {
        let material = format!("{}|{}", seed, salt);
        let digest = sha256::digest(material.as_str());
        Ok(SaltedRng {
            rng: ChaCha20Rng::from_seed(seed_from_digest(&digest, salt)?),
        })
    }

    /// Unbiased integer in [0, n). Returns `None` if `n == 0`.
    ///
    /// Draws below `2^64 mod n` are rejected, so that `x % n` is uniform.
    pub fn gen_range(&mut self, n: u64) -> Option<u64> {
        if n == 0 {
            return None;
        }
        let threshold = n.wrapping_neg() % n;
        loop {
            let x = self.rng.next_u64();
            if x >= threshold {
                return Some(x % n);
            }
        }
    }

    /// In-place Fisher–Yates shuffle.
    pub fn shuffle_in_place<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            if let Some(j) = self.gen_range(i as u64 + 1) {
                slice.swap(i, j as usize);
            }
        }
    }
}

/// Decodes a SHA-256 hex digest into the 32 bytes of a ChaCha20 seed.
pub fn seed_from_digest(digest: &str, salt: &str) -> LotteryResult<[u8; 32]> {
    let mut seed = [0u8; 32];
    hex::decode_to_slice(digest, &mut seed).context(SeedDerivationSnafu { salt })?;
    Ok(seed)
}

/// Returns a permutation of `items`, determined by `seed` and `salt`.
///
/// The input order matters: the same items given in a different order give a
/// different permutation. Callers keep the input order of the file.
pub fn shuffle<T: Clone>(items: &[T], seed: u64, salt: &str) -> LotteryResult<Vec<T>> {
    let mut res = items.to_vec();
    SaltedRng::new(seed, salt)?.shuffle_in_place(&mut res);
    Ok(res)
}
