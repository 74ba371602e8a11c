//! Deterministic workloads for the Coffer benchmarks.
//!
//! Every generator is driven by a seeded ChaCha8 RNG, so two runs with the
//! same seed exercise the containers with identical operation streams:
//!
//! - [`key_stream`]: hash-map keys with a controllable duplicate rate
//! - [`deque_script`]: mixed push/pop traffic at both ends of a deque
//! - [`positions`]: insertion indices for middle-of-sequence edits

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// One step of a deque workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DequeOp {
    /// Append at the back.
    PushBack(u64),
    /// Prepend at the front.
    PushFront(u64),
    /// Remove from the back.
    PopBack,
    /// Remove from the front.
    PopFront,
}

/// `n` keys drawn from `0..universe`.
///
/// A small universe relative to `n` produces many repeated keys, which
/// exercises the existing-key path of map insertion.
pub fn key_stream(seed: u64, n: usize, universe: u64) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..universe.max(1))).collect()
}

/// `n` deque operations, pushes weighted 2:1 over pops so the deque grows.
pub fn deque_script(seed: u64, n: usize) -> Vec<DequeOp> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| match rng.gen_range(0..6u8) {
            0 | 1 => DequeOp::PushBack(rng.gen()),
            2 | 3 => DequeOp::PushFront(rng.gen()),
            4 => DequeOp::PopBack,
            _ => DequeOp::PopFront,
        })
        .collect()
}

/// `n` insertion positions for a sequence that starts at `start` elements
/// and grows by one per insertion.
pub fn positions(seed: u64, start: usize, n: usize) -> Vec<usize> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|i| rng.gen_range(0..=start + i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workloads_are_deterministic() {
        assert_eq!(key_stream(7, 100, 50), key_stream(7, 100, 50));
        assert_eq!(deque_script(7, 100), deque_script(7, 100));
        assert_eq!(positions(7, 10, 100), positions(7, 10, 100));
    }

    #[test]
    fn keys_stay_in_universe() {
        assert!(key_stream(1, 1000, 16).iter().all(|&k| k < 16));
        assert!(key_stream(1, 10, 0).iter().all(|&k| k == 0));
    }

    #[test]
    fn positions_are_valid_insertion_points() {
        for (i, &p) in positions(3, 5, 200).iter().enumerate() {
            assert!(p <= 5 + i, "position {p} past end at step {i}");
        }
    }

    #[test]
    fn script_mixes_both_ends() {
        let script = deque_script(11, 600);
        assert!(script.iter().any(|op| matches!(op, DequeOp::PushFront(_))));
        assert!(script.iter().any(|op| matches!(op, DequeOp::PopBack)));
    }
}
