//! Row resampling with per-resample RNG streams.
//!
//! Resample `b` draws from its own `Xoshiro256PlusPlus`, seeded with
//! [`counter_rng_seed`]`(seed, b)`. No RNG state is shared between
//! resamples, so the serial and rayon paths produce identical alphas in
//! identical order.

use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::alpha::{raw_alpha, MissingDataPolicy};
use crate::error::AlphaError;
use crate::matrix::ItemMatrix;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Derives the seed of stream `counter` from a base seed.
///
/// SplitMix64 finalizer over `seed + (counter + 1)·γ`, so neighbouring
/// counters give unrelated streams.
pub fn counter_rng_seed(seed: u64, counter: u64) -> u64 {
    const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut z = seed.wrapping_add(counter.wrapping_add(1).wrapping_mul(GAMMA));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// `n` row indices drawn uniformly with replacement.
pub(super) fn draw_rows<R: Rng>(n: usize, rng: &mut R) -> Vec<usize> {
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

/// Raw alpha of resample `b`.
fn resample_alpha(
    matrix: &ItemMatrix,
    seed: u64,
    b: usize,
    policy: MissingDataPolicy,
) -> Result<f64, AlphaError> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, b as u64));
    let rows = draw_rows(matrix.n_rows(), &mut rng);
    raw_alpha(&matrix.select_rows(&rows), policy)
}

/// Raw alpha of every resample, in resample order.
pub(super) fn resampled_alphas(
    matrix: &ItemMatrix,
    resamples: usize,
    seed: u64,
    policy: MissingDataPolicy,
) -> Vec<Result<f64, AlphaError>> {
    #[cfg(feature = "parallel")]
    let outcomes = (0..resamples)
        .into_par_iter()
        .map(|b| resample_alpha(matrix, seed, b, policy))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes = (0..resamples)
        .map(|b| resample_alpha(matrix, seed, b, policy))
        .collect();

    outcomes
}

/// Raw alpha with each row left out in turn; undefined entries are `None`.
pub(super) fn jackknife_alphas(matrix: &ItemMatrix, policy: MissingDataPolicy) -> Vec<Option<f64>> {
    let n = matrix.n_rows();
    (0..n)
        .map(|skip| {
            let rows: Vec<usize> = (0..n).filter(|&r| r != skip).collect();
            raw_alpha(&matrix.select_rows(&rows), policy).ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ItemMatrix {
        ItemMatrix::from_columns(vec![
            vec![4.0, 3.0, 5.0, 2.0, 4.0, 3.0, 5.0, 2.0, 1.0, 4.0],
            vec![3.0, 3.0, 4.0, 2.0, 5.0, 2.0, 4.0, 1.0, 2.0, 4.0],
            vec![5.0, 2.0, 4.0, 3.0, 4.0, 3.0, 5.0, 2.0, 1.0, 3.0],
        ])
        .expect("rectangular")
    }

    #[test]
    fn seeds_differ_per_counter() {
        let a = counter_rng_seed(42, 0);
        let b = counter_rng_seed(42, 1);
        let c = counter_rng_seed(43, 0);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, counter_rng_seed(42, 0));
    }

    #[test]
    fn drawn_rows_in_range() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        let rows = draw_rows(13, &mut rng);
        assert_eq!(rows.len(), 13);
        assert!(rows.iter().all(|&r| r < 13));
    }

    #[test]
    fn resampling_is_reproducible() {
        let m = sample();
        let a = resampled_alphas(&m, 50, 99, MissingDataPolicy::Listwise);
        let b = resampled_alphas(&m, 50, 99, MissingDataPolicy::Listwise);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
    }

    #[test]
    fn resample_order_matches_single_draws() {
        let m = sample();
        let all = resampled_alphas(&m, 20, 5, MissingDataPolicy::Listwise);
        for (b, got) in all.iter().enumerate() {
            assert_eq!(got, &resample_alpha(&m, 5, b, MissingDataPolicy::Listwise));
        }
    }

    #[test]
    fn jackknife_leaves_one_row_out() {
        let m = sample();
        let jack = jackknife_alphas(&m, MissingDataPolicy::Listwise);
        assert_eq!(jack.len(), 10);
        let rows: Vec<usize> = (1..10).collect();
        let expected = raw_alpha(&m.select_rows(&rows), MissingDataPolicy::Listwise).ok();
        assert_eq!(jack[0], expected);
    }
}
