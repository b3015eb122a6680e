//! Rekeying-period and epoch-schedule searches.
//!
//! The four operations here answer the questions the cache designer actually
//! asks. For an ideal randomizer, how many accesses fit in one key's lifetime
//! before the adversary's advantage can exceed a target
//! ([`rekeying_period`]), and how does adversarial observation noise extend
//! that ([`noisy_rekeying_period`])? For a concrete randomizer and rekeying
//! function with known advantages, what period fits a fixed number of epochs
//! ([`fixed_epoch_schedule`]), and which epoch count maximizes the total
//! guaranteed accesses ([`optimal_epoch_schedule`])?
//!
//! Infeasibility is a normal outcome: a zero period (or zeroed schedule)
//! means no parameter at or below the ceilings satisfies the target.
//! Out-of-domain inputs are rejected with [`RekeyError::InvalidParameter`]
//! before any search runs.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::binomial::{collision_tail, noisy_collision_tail};
use crate::error::{RekeyError, Result};
use crate::search::largest_period_within;

/// Cache geometry the advantage bounds are evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheGeometry {
    /// Ways per cache set (the collision threshold `a`).
    pub associativity: u64,
    /// Number of cache sets; each access collides with probability `1/sets`.
    pub sets: u64,
}

impl CacheGeometry {
    pub fn new(associativity: u64, sets: u64) -> Result<Self> {
        let geometry = CacheGeometry { associativity, sets };
        geometry.validate()?;
        Ok(geometry)
    }

    fn validate(&self) -> Result<()> {
        require_nonzero("associativity", self.associativity)?;
        require_nonzero("sets", self.sets)
    }

    fn collision_probability(&self) -> f64 {
        1.0 / self.sets as f64
    }
}

/// Advantage budget for the multi-epoch searches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochBudget {
    /// Advantage already conceded to the rekeying function over the whole
    /// schedule (`Adv_rekey`).
    pub rekey_advantage: f64,
    /// Advantage conceded to the cache randomizer within each epoch
    /// (`Adv_rand`).
    pub randomizer_advantage: f64,
    /// Target advantage for the whole schedule; must leave headroom above
    /// `rekey_advantage` for any epoch to be admissible.
    pub target_advantage: f64,
    /// Upper bound on the per-epoch rekeying period (`N'`).
    pub period_ceiling: u64,
}

impl EpochBudget {
    fn validate(&self) -> Result<()> {
        require_unit_interval("rekey_advantage", self.rekey_advantage)?;
        require_unit_interval("randomizer_advantage", self.randomizer_advantage)?;
        require_unit_interval("target_advantage", self.target_advantage)
    }
}

/// Result of a multi-epoch search. All-zero means no feasible schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EpochSchedule {
    /// Number of epochs the mapping key is rekeyed across (`R`).
    pub epochs: u64,
    /// Accesses per epoch between rekeyings (`N`).
    pub period: u64,
    /// Total guaranteed-secure accesses (`R * N`).
    pub total_accesses: u64,
}

impl EpochSchedule {
    pub fn is_feasible(&self) -> bool {
        self.period > 0
    }
}

/// Largest rekeying period keeping an ideal randomizer's advantage at or
/// below `target`. Returns 0 when even a single access exceeds the target.
pub fn rekeying_period(geometry: CacheGeometry, target: f64) -> Result<u64> {
    geometry.validate()?;
    require_unit_interval("target", target)?;

    let a = geometry.associativity;
    let p = geometry.collision_probability();
    Ok(largest_period_within(
        |n| collision_tail(a, n, p),
        target,
        u64::MAX,
    ))
}

/// Largest rekeying period under noise level `rho`, the fraction of accesses
/// the adversary cannot observe.
pub fn noisy_rekeying_period(geometry: CacheGeometry, target: f64, rho: f64) -> Result<u64> {
    geometry.validate()?;
    require_unit_interval("target", target)?;
    require_unit_interval("rho", rho)?;

    let a = geometry.associativity;
    let p = geometry.collision_probability();
    Ok(largest_period_within(
        |n| noisy_collision_tail(n, p, a, rho),
        target,
        u64::MAX,
    ))
}

/// Largest per-epoch period for a schedule of exactly `epochs` epochs, under
/// the bound `rekey_advantage + epochs * (tail + randomizer_advantage)`.
pub fn fixed_epoch_schedule(
    geometry: CacheGeometry,
    epochs: u64,
    budget: EpochBudget,
) -> Result<EpochSchedule> {
    geometry.validate()?;
    require_nonzero("epochs", epochs)?;
    budget.validate()?;

    Ok(schedule_for(geometry, epochs, budget))
}

/// Epoch count and period maximizing the total guaranteed accesses `R * N`.
///
/// Sweeps `R` from 1 to `min(epoch_ceiling, ceil(headroom /
/// randomizer_advantage))`; beyond that cap the fixed per-epoch advantages
/// alone exhaust the target. Each candidate runs an independent period
/// search; with the `parallel` feature the sweep is a rayon map-reduce.
/// Ties on `R * N` keep the smallest epoch count.
pub fn optimal_epoch_schedule(
    geometry: CacheGeometry,
    epoch_ceiling: u64,
    budget: EpochBudget,
) -> Result<EpochSchedule> {
    geometry.validate()?;
    require_nonzero("epoch_ceiling", epoch_ceiling)?;
    budget.validate()?;
    if budget.randomizer_advantage <= 0.0 {
        return Err(RekeyError::invalid(
            "randomizer_advantage",
            budget.randomizer_advantage,
            "must be positive to bound the epoch sweep",
        ));
    }

    let headroom = budget.target_advantage - budget.rekey_advantage;
    if headroom <= 0.0 {
        return Ok(EpochSchedule::default());
    }
    let cap = epoch_ceiling.min((headroom / budget.randomizer_advantage).ceil() as u64);
    debug!(cap, "sweeping epoch candidates");

    #[cfg(feature = "parallel")]
    let best = (1..=cap)
        .into_par_iter()
        .map(|epochs| schedule_for(geometry, epochs, budget))
        .reduce(EpochSchedule::default, prefer);

    #[cfg(not(feature = "parallel"))]
    let best = (1..=cap)
        .map(|epochs| schedule_for(geometry, epochs, budget))
        .fold(EpochSchedule::default(), prefer);

    Ok(best)
}

/// One fixed-R period search. Inputs are assumed validated.
fn schedule_for(geometry: CacheGeometry, epochs: u64, budget: EpochBudget) -> EpochSchedule {
    let a = geometry.associativity;
    let p = geometry.collision_probability();
    let r = epochs as f64;
    let bound =
        move |n| budget.rekey_advantage + r * (collision_tail(a, n, p) + budget.randomizer_advantage);

    let period = largest_period_within(bound, budget.target_advantage, budget.period_ceiling);
    if period == 0 {
        return EpochSchedule::default();
    }
    EpochSchedule {
        epochs,
        period,
        total_accesses: epochs.saturating_mul(period),
    }
}

/// Deterministic reduce for the epoch sweep: more total accesses wins, ties
/// keep the smaller epoch count. Associative and commutative, so the rayon
/// and sequential paths agree.
fn prefer(current: EpochSchedule, candidate: EpochSchedule) -> EpochSchedule {
    if candidate.total_accesses > current.total_accesses
        || (candidate.total_accesses == current.total_accesses
            && candidate.is_feasible()
            && candidate.epochs < current.epochs)
    {
        candidate
    } else {
        current
    }
}

fn require_nonzero(name: &'static str, value: u64) -> Result<()> {
    if value == 0 {
        return Err(RekeyError::invalid(name, value, "must be at least 1"));
    }
    Ok(())
}

fn require_unit_interval(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(RekeyError::invalid(name, value, "must lie in [0, 1]"));
    }
    Ok(())
}
