//! Exact binomial tail probabilities for the set-occupancy event.
//!
//! An epoch of `n` accesses fills a victim's cache set once `a` of them
//! collide into it, each independently with probability `p = 1/S`. The
//! advantage bounds are therefore survival probabilities of a Binomial(n, p)
//! count at threshold `a`, summed term by term (`a` is small, `n` is not).
//!
//! Binomial coefficients are carried as exact big integers and converted to
//! f64 only for the final multiply against the floating-point powers, so the
//! partial sums keep full precision for `n` in the tens of thousands.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive};

/// Probability that a Binomial(n, p) variable reaches or exceeds `a`.
///
/// Evaluates `1 - sum_{i=0}^{a-1} C(n,i) p^i (1-p)^(n-i)` directly. The
/// coefficient row is built incrementally via `C(n,i+1) = C(n,i)(n-i)/(i+1)`,
/// which is an exact integer division at every step.
///
/// Non-decreasing in `n` for fixed `a` and `p`; the period searches rely on
/// that. Callers must supply `p` in [0, 1]; out-of-range values are not
/// detected here.
///
/// Degenerate thresholds behave as the counting event dictates: `a = 0` gives
/// 1 for every `n`, and `a > n` gives 0 (fewer than `a` trials cannot produce
/// `a` collisions).
pub fn collision_tail(a: u64, n: u64, p: f64) -> f64 {
    let q = 1.0 - p;
    let mut sum = 1.0;
    let mut coeff = BigUint::one();
    for i in 0..a {
        if i > n {
            // C(n, i) = 0 from here on; the tail below n trials is empty.
            break;
        }
        let pmf = coeff.to_f64().unwrap_or(f64::INFINITY)
            * p.powi(i as i32)
            * q.powf((n - i) as f64);
        sum -= pmf;
        coeff = coeff * (n - i) / (i + 1);
    }
    sum
}

/// Survival probability of the occupancy event when only part of the trace
/// is observable.
///
/// Splits the `n` accesses into `m = floor(rho * n)` noised ones and `n - m`
/// clean ones, conditions on the number `i < a` of slots taken by noised
/// accesses, and requires the clean accesses to fill the remaining `a - i`:
///
/// `sum_{i=0}^{a-1} C(m,i) p^i (1-p)^(m-i) * P[Binomial(n-m, p) >= a-i]`
///
/// A slot count that cannot be completed (`a - i > n - m`) contributes
/// nothing. The period search treats this as non-decreasing in `n` for fixed
/// `a`, `p`, `rho`. That holds at every step where the extra access lands in
/// the clean fraction; steps that grow `floor(rho * n)` can dip slightly, so
/// the searcher re-checks its result (see `search`). `rho` must lie in
/// [0, 1].
pub fn noisy_collision_tail(n: u64, p: f64, a: u64, rho: f64) -> f64 {
    let noised = (rho * n as f64).floor() as u64;
    let clean = n - noised;
    let q = 1.0 - p;

    let mut sum = 0.0;
    let mut coeff = BigUint::one();
    for i in 0..a {
        if i > noised {
            break;
        }
        let observed = coeff.to_f64().unwrap_or(f64::INFINITY)
            * p.powi(i as i32)
            * q.powf((noised - i) as f64);
        sum += observed * collision_tail(a - i, clean, p);
        coeff = coeff * (noised - i) / (i + 1);
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_threshold_one_matches_closed_form() {
        // P[X >= 1] = 1 - (1-p)^n
        for n in [1u64, 2, 10, 100, 5000] {
            for p in [0.5f64, 0.1, 1.0 / 12288.0] {
                let expected = 1.0 - (1.0 - p).powf(n as f64);
                let got = collision_tail(1, n, p);
                assert!(
                    (got - expected).abs() < EPS,
                    "tail(1, {}, {}) = {} != {}",
                    n,
                    p,
                    got,
                    expected
                );
            }
        }
    }

    #[test]
    fn test_two_trials_half() {
        // P[Binomial(2, 1/2) >= 2] = 1/4
        let got = collision_tail(2, 2, 0.5);
        assert!((got - 0.25).abs() < EPS, "got {}", got);
    }

    #[test]
    fn test_threshold_above_trials_is_zero() {
        for (a, n) in [(2u64, 1u64), (16, 15), (16, 0), (5, 4)] {
            let got = collision_tail(a, n, 0.3);
            assert!(got.abs() < EPS, "tail({}, {}, 0.3) = {} should be 0", a, n, got);
        }
    }

    #[test]
    fn test_zero_threshold_is_one() {
        for n in [0u64, 1, 100, 10000] {
            assert_eq!(collision_tail(0, n, 0.2), 1.0);
        }
    }

    #[test]
    fn test_degenerate_probabilities() {
        assert!(collision_tail(4, 100, 0.0).abs() < EPS);
        assert!((collision_tail(4, 100, 1.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_large_n_small_p_stays_in_range() {
        let p = 1.0 / 12288.0;
        for n in [1u64, 1000, 80_000, 500_000] {
            let got = collision_tail(16, n, p);
            assert!(
                (-EPS..=1.0 + EPS).contains(&got),
                "tail(16, {}, p) = {} out of range",
                n,
                got
            );
        }
    }

    #[test]
    fn test_noisy_tail_with_no_noise_matches_plain() {
        let p = 1.0 / 256.0;
        for n in [1u64, 10, 1000, 20_000] {
            let plain = collision_tail(8, n, p);
            let noisy = noisy_collision_tail(n, p, 8, 0.0);
            assert!(
                (plain - noisy).abs() < EPS,
                "rho=0 mismatch at n={}: {} vs {}",
                n,
                plain,
                noisy
            );
        }
    }

    #[test]
    fn test_full_noise_is_zero_below_threshold() {
        // With every access noised, no clean access can complete the set.
        let got = noisy_collision_tail(1000, 1.0 / 64.0, 4, 1.0);
        assert!(got.abs() < EPS, "got {}", got);
    }

    #[test]
    fn test_noise_never_increases_the_bound() {
        // Hiding accesses from the adversary can only shrink the tail.
        let p = 1.0 / 1024.0;
        let n = 30_000;
        let plain = collision_tail(8, n, p);
        for rho in [0.1, 0.5, 0.9] {
            let noisy = noisy_collision_tail(n, p, 8, rho);
            assert!(
                noisy <= plain + EPS,
                "rho={} raised the bound: {} > {}",
                rho,
                noisy,
                plain
            );
        }
    }

    #[test]
    fn test_idempotent() {
        let a = collision_tail(16, 42_000, 1.0 / 12288.0);
        let b = collision_tail(16, 42_000, 1.0 / 12288.0);
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn prop_tail_in_unit_interval(a in 0u64..24, n in 0u64..20_000, s in 2u64..20_000) {
            let got = collision_tail(a, n, 1.0 / s as f64);
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&got), "tail = {}", got);
        }

        #[test]
        fn prop_tail_monotone_in_n(a in 1u64..20, n in 0u64..10_000, s in 2u64..20_000) {
            let p = 1.0 / s as f64;
            let lo = collision_tail(a, n, p);
            let hi = collision_tail(a, n + 1, p);
            prop_assert!(lo <= hi + 1e-9, "tail({}, {}, {}) = {} > {} at n+1", a, n, p, lo, hi);
        }

        #[test]
        fn prop_noisy_tail_monotone_while_noised_count_fixed(
            a in 1u64..16,
            n in 0u64..5_000,
            s in 2u64..10_000,
            rho in 0.0f64..1.0,
        ) {
            // Monotone steps are the ones where the extra access lands in the
            // clean fraction; a step that grows floor(rho * n) can dip.
            prop_assume!((rho * (n + 1) as f64).floor() == (rho * n as f64).floor());
            let p = 1.0 / s as f64;
            let lo = noisy_collision_tail(n, p, a, rho);
            let hi = noisy_collision_tail(n + 1, p, a, rho);
            prop_assert!(lo <= hi + 1e-9, "noisy tail dropped from {} to {} at n={}", lo, hi, n);
        }

        #[test]
        fn prop_noisy_tail_in_unit_interval(
            a in 0u64..16,
            n in 0u64..5_000,
            s in 2u64..10_000,
            rho in 0.0f64..1.0,
        ) {
            let got = noisy_collision_tail(n, 1.0 / s as f64, a, rho);
            prop_assert!((-1e-9..=1.0 + 1e-9).contains(&got), "noisy tail = {}", got);
        }
    }
}
