// Copyright (C) 2025 Jeremy J. Carroll. See LICENSE for details.

//! Small deterministic helpers for bench cases.
//!
//! Benches use these to derive reproducible workloads from define values,
//! e.g. a `SEED` define feeding [`prng`], or an `ORDER` define selecting one
//! of `factorial(n)` insertion orders through [`permutation`].

/// One step of a xorshift32 generator.
///
/// Reproducibility matters more than quality here. A zero state is treated
/// as `u32::MAX`, so seed 0 and seed 1 give different streams.
pub fn prng(state: &mut u32) -> u32 {
    let mut x = *state;
    if x == 0 {
        x = u32::MAX;
    }
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

/// `n!`, wrapping on overflow.
pub fn factorial(n: usize) -> usize {
    (2..=n).fold(1, usize::wrapping_mul)
}

/// Fill `buffer` with the `i`th permutation of `0..buffer.len()`.
///
/// Every `i` in `0..factorial(len)` gives a distinct permutation. Runs in
/// O(n) with no extra memory, at the cost of a non-lexicographic order.
pub fn permutation(mut i: usize, buffer: &mut [u32]) {
    let size = buffer.len();
    for (j, slot) in buffer.iter_mut().enumerate() {
        *slot = j as u32;
    }

    for j in 0..size {
        let rem = size - j;
        buffer.swap(j, j + i % rem);
        i /= rem;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prng_zero_seed() {
        let mut zero = 0;
        let mut max = u32::MAX;
        assert_eq!(prng(&mut zero), prng(&mut max));
        assert_eq!(zero, max);

        let mut one = 1;
        assert_ne!(prng(&mut one), zero);
    }

    #[test]
    fn test_prng_reproducible() {
        let mut a = 42;
        let mut b = 42;
        let xs: Vec<u32> = (0..8).map(|_| prng(&mut a)).collect();
        let ys: Vec<u32> = (0..8).map(|_| prng(&mut b)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().all(|&x| x != 0));
        assert_eq!(prng(&mut 1), 270_369);
    }

    #[test]
    fn test_factorial() {
        assert_eq!(factorial(0), 1);
        assert_eq!(factorial(1), 1);
        assert_eq!(factorial(5), 120);
        assert_eq!(factorial(10), 3_628_800);
    }

    #[test]
    fn test_permutation_identity() {
        let mut buffer = [9; 4];
        permutation(0, &mut buffer);
        assert_eq!(buffer, [0, 1, 2, 3]);
    }

    #[test]
    fn test_permutation_covers_all() {
        let mut seen = HashSet::new();
        let mut buffer = [0u32; 4];
        for i in 0..factorial(4) {
            permutation(i, &mut buffer);
            let mut sorted = buffer;
            sorted.sort_unstable();
            assert_eq!(sorted, [0, 1, 2, 3]);
            seen.insert(buffer);
        }
        assert_eq!(seen.len(), 24);
    }
}
