//! Monotone bound inversion for the period searches.
//!
//! Every search in this crate reduces to the same question: given a bound
//! function that is non-decreasing in the number of accesses, what is the
//! largest period at or below a ceiling whose bound still fits the target
//! advantage? The answer is reconstructed bit by bit (double until the
//! bound is exceeded, then greedily re-add lower powers of two), so a search
//! up to `ceiling` costs O(log ceiling) bound evaluations instead of a
//! linear scan.

use tracing::{debug, warn};

/// Largest `n <= ceiling` with `bound(n) <= target`, assuming `bound` is
/// non-decreasing in `n`.
///
/// Returns 0 when even `n = 1` exceeds the target (or the ceiling is 0);
/// a zero period is the caller's "no feasible parameter" signal, not an
/// error. Pass `u64::MAX` as the ceiling for an unbounded search: the
/// doubling phase still terminates once the bound crosses the target, and
/// exponent overflow is treated as hitting the ceiling.
///
/// The bound is evaluated once more at `n + 1` after a successful interior
/// search. A feasible value there means the numeric evaluation of the bound
/// lost monotonicity and the refinement may have stopped short; the result
/// is still returned, with a warning.
pub fn largest_period_within<B>(bound: B, target: f64, ceiling: u64) -> u64
where
    B: Fn(u64) -> f64,
{
    let mut t = 0u32;
    loop {
        match 1u64.checked_shl(t) {
            Some(n) if n <= ceiling && bound(n) <= target => t += 1,
            _ => break,
        }
    }
    if t == 0 {
        return 0;
    }

    let mut out = 1u64 << (t - 1);
    if t >= 2 {
        for i in (0..=t - 2).rev() {
            let candidate = out + (1u64 << i);
            if candidate <= ceiling && bound(candidate) <= target {
                out = candidate;
            }
        }
    }
    debug!(exponent = t, period = out, "period search settled");

    if out < ceiling && bound(out + 1) <= target {
        warn!(
            period = out,
            "bound is non-monotone next to the search result; the period may be conservative"
        );
    }
    out
}
