//! Statistics used to score relationships between clusters: Pearson and
//! Spearman correlation, and a permutation test on Spearman's rho.

/// Number of permutations used by [`spearman_permutation_test`]. An
/// implementation constant, not a tunable.
const PERMUTATIONS: usize = 2000;

/// Sample Pearson correlation of `x[..n]` and `y[..n]`.
///
/// Returns `None` ("absent") when either sample has zero variance, since
/// the correlation is undefined in that case.
pub fn pearson(x: &[f64], y: &[f64], n: usize) -> Option<f64> {
    assert!(x.len() >= n && y.len() >= n);

    let mean_x = x[..n].iter().sum::<f64>() / n as f64;
    let mean_y = y[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for i in 0..n {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Rank-transform `values` with average ranks for ties (1-based ranks).
///
/// Uses `total_cmp` rather than `partial_cmp` so a non-finite input can never
/// panic; callers that care about non-finite input rejecting the result
/// entirely (rather than getting a well-defined but meaningless rank) check
/// for it themselves (see [`spearman`]).
fn rank_with_average_ties(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let avg_rank = ((i + 1) + (j + 1)) as f64 / 2.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }
    ranks
}

/// True iff every value in `values` is finite (neither NaN nor infinite).
fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

/// Spearman rank correlation of `x[..n]` and `y[..n]`.
///
/// `work` is scratch space of length at least `2 * n`, used to hold the two
/// rank-transformed series before correlating them. Returns `None`
/// ("absent") if either series contains a non-finite value, same as
/// [`pearson`]'s zero-variance case.
pub fn spearman(x: &[f64], y: &[f64], n: usize, work: &mut [f64]) -> Option<f64> {
    assert!(work.len() >= 2 * n);

    if !all_finite(&x[..n]) || !all_finite(&y[..n]) {
        return None;
    }

    let rank_x = rank_with_average_ties(&x[..n]);
    let rank_y = rank_with_average_ties(&y[..n]);

    let (wx, wy) = work.split_at_mut(n);
    wx[..n].copy_from_slice(&rank_x);
    wy[..n].copy_from_slice(&rank_y);

    pearson(wx, wy, n)
}

/// Two-sided permutation p-value for an observed Spearman `rho`.
///
/// Shuffles `y`'s ranks [`PERMUTATIONS`] times using a caller-owned,
/// deterministic `seed`; `seed` is advanced in place so that a later call
/// continues the same stream rather than repeating it. `work1`/`work2` are
/// scratch space of length at least `n`, used to hold the fixed ranks of `x`
/// and the permuted ranks of `y` respectively.
///
/// Returns `NaN` ("absent") if `x`, `y`, or `rho` is non-finite, rather than
/// computing a meaningless p-value against garbage ranks.
pub fn spearman_permutation_test(
    x: &[f64],
    y: &[f64],
    n: usize,
    work1: &mut [f64],
    work2: &mut [f64],
    seed: &mut u64,
    rho: f64,
) -> f64 {
    assert!(work1.len() >= n && work2.len() >= n);

    if !rho.is_finite() || !all_finite(&x[..n]) || !all_finite(&y[..n]) {
        return f64::NAN;
    }

    let rank_x = rank_with_average_ties(&x[..n]);
    let rank_y = rank_with_average_ties(&y[..n]);
    work1[..n].copy_from_slice(&rank_x);
    work2[..n].copy_from_slice(&rank_y);

    let target = rho.abs();
    let mut hits = 0usize;

    let mut rng = fastrand::Rng::with_seed(*seed);
    for _ in 0..PERMUTATIONS {
        rng.shuffle(&mut work2[..n]);
        if let Some(rho_p) = pearson(&work1[..n], &work2[..n], n) {
            if rho_p.abs() >= target {
                hits += 1;
            }
        }
    }

    // Advance the caller's seed deterministically so a subsequent call
    // continues this stream instead of repeating it.
    *seed = rng.u64(..);

    hits as f64 / PERMUTATIONS as f64
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::perfectly_correlated(&[1.0, 2.0, 3.0, 4.0, 5.0], &[2.0, 4.0, 6.0, 8.0, 10.0], Some(1.0))]
    #[case::perfectly_anticorrelated(&[1.0, 2.0, 3.0, 4.0, 5.0], &[10.0, 8.0, 6.0, 4.0, 2.0], Some(-1.0))]
    #[case::constant_series_is_absent(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0], None)]
    fn pearson_matches_expected(#[case] x: &[f64], #[case] y: &[f64], #[case] expected: Option<f64>) {
        let r = pearson(x, y, x.len());
        match expected {
            Some(want) => assert!(approx_eq!(f64, r.unwrap(), want, epsilon = 1e-9)),
            None => assert_eq!(r, None),
        }
    }

    #[rstest]
    #[case::nonlinear_monotone(&[1.0, 2.0, 3.0, 4.0, 5.0], &[1.0, 8.0, 27.0, 64.0, 125.0], Some(1.0))]
    #[case::nan_coordinate_is_absent(&[1.0, 2.0, f64::NAN], &[1.0, 2.0, 3.0], None)]
    fn spearman_matches_expected(#[case] x: &[f64], #[case] y: &[f64], #[case] expected: Option<f64>) {
        let mut work = vec![0.0; 2 * x.len()];
        let rho = spearman(x, y, x.len(), &mut work);
        match expected {
            Some(want) => assert!(approx_eq!(f64, rho.unwrap(), want, epsilon = 1e-9)),
            None => assert_eq!(rho, None),
        }
    }

    #[test]
    fn spearman_averages_tied_ranks() {
        let x = [1.0, 1.0, 2.0, 3.0];
        let ranks = rank_with_average_ties(&x);
        assert_eq!(ranks, vec![1.5, 1.5, 3.0, 4.0]);
    }

    #[test]
    fn permutation_test_on_non_finite_rho_is_absent() {
        let x = [1.0, 2.0, 3.0];
        let y = [3.0, 2.0, 1.0];
        let mut w1 = vec![0.0; 3];
        let mut w2 = vec![0.0; 3];
        let mut seed = 1u64;
        let p = spearman_permutation_test(&x, &y, 3, &mut w1, &mut w2, &mut seed, f64::NAN);
        assert!(p.is_nan());
    }

    #[test]
    fn permutation_test_on_identical_series_is_deterministic() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y = x.clone();
        let mut work = vec![0.0; 40];
        let rho = spearman(&x, &y, 20, &mut work).unwrap();
        assert!(approx_eq!(f64, rho, 1.0, epsilon = 1e-9));

        let mut w1 = vec![0.0; 20];
        let mut w2 = vec![0.0; 20];
        let mut seed1 = 42u64;
        let p1 = spearman_permutation_test(&x, &y, 20, &mut w1, &mut w2, &mut seed1, rho);

        let mut w1b = vec![0.0; 20];
        let mut w2b = vec![0.0; 20];
        let mut seed2 = 42u64;
        let p2 = spearman_permutation_test(&x, &y, 20, &mut w1b, &mut w2b, &mut seed2, rho);

        assert!(approx_eq!(f64, p1, p2, epsilon = 1e-12));
        assert!(p1 <= 1.0 / PERMUTATIONS as f64 + 1e-12);
        assert_eq!(seed1, seed2);
    }

    #[test]
    fn repeated_calls_advance_the_seed() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..10).map(|i| (10 - i) as f64).collect();
        let mut w1 = vec![0.0; 10];
        let mut w2 = vec![0.0; 10];
        let mut seed = 7u64;

        let first_seed = seed;
        let _ = spearman_permutation_test(&x, &y, 10, &mut w1, &mut w2, &mut seed, -1.0);
        assert_ne!(seed, first_seed);
    }
}
