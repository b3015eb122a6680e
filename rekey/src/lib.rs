//! Rekeying-parameter selection for randomization-based protected caches.
//!
//! Given a cache geometry (associativity `a`, number of sets `S`) and an
//! adversary-advantage budget, this crate computes the largest rekeying
//! period `N` (accesses between re-randomizations of the mapping key) for
//! which the advantage bounds of "A Security Model for Randomization-based
//! Protected Caches" (Ribes-Gonzalez, Farras, Hernandez, Kostalabros,
//! Moreto) stay at or below a target. The multi-epoch searches additionally
//! pick the epoch count `R` that maximizes the total `R * N` of
//! guaranteed-secure accesses.
//!
//! - `binomial`: exact tail probabilities of the set-occupancy event
//! - `search`: monotone bound inversion (doubling plus bit refinement)
//! - `schedule`: the user-facing period and epoch-schedule searches
//! - `error`: parameter validation failures
//!
//! The crate is pure computation: no I/O, no shared state, every call
//! independent. The `parallel` feature lets the epoch sweep fan out on
//! rayon.

pub mod binomial;
pub mod error;
pub mod schedule;
pub mod search;

pub use error::{RekeyError, Result};
pub use schedule::{
    fixed_epoch_schedule, noisy_rekeying_period, optimal_epoch_schedule, rekeying_period,
    CacheGeometry, EpochBudget, EpochSchedule,
};
