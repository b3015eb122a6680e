//! Command-line front end for the rekeying-parameter searches.
//!
//! Each subcommand takes the cache geometry and advantage budget as
//! positional arguments, echoes the computed result to stdout, and writes a
//! one-line formatted record to a report file (overridable with `--output`).
//!
//! Examples:
//!
//! ```text
//! rekey-params single 16 12288 0.01
//! rekey-params single-noise 16 12288 0.01 0.9
//! rekey-params multi-fixed 16 12288 10 0.00001 80000 0.004 0.05
//! rekey-params multi-optimal 16 12288 10 0.00001 80000 0.004 0.05
//! ```

use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rekey::{
    fixed_epoch_schedule, noisy_rekeying_period, optimal_epoch_schedule, rekeying_period,
    CacheGeometry, EpochBudget,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Rekeying-period selection for randomization-based protected caches")]
struct Cli {
    /// Report file path; defaults to a per-subcommand name
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Largest rekeying period N with an ideal randomizer's advantage at most Adv
    Single {
        /// Associativity of the cache
        #[arg(value_name = "a")]
        associativity: u64,
        /// Number of cache sets
        #[arg(value_name = "S")]
        sets: u64,
        /// Target advantage
        #[arg(value_name = "Adv")]
        adv: f64,
    },
    /// Largest rekeying period N under noise level rho
    SingleNoise {
        /// Associativity of the cache
        #[arg(value_name = "a")]
        associativity: u64,
        /// Number of cache sets
        #[arg(value_name = "S")]
        sets: u64,
        /// Target advantage
        #[arg(value_name = "Adv")]
        adv: f64,
        /// Fraction of accesses the adversary cannot observe
        #[arg(value_name = "rho")]
        rho: f64,
    },
    /// Per-epoch period N for a fixed number of epochs R, printed as [N, R*N]
    MultiFixed {
        /// Associativity of the cache
        #[arg(value_name = "a")]
        associativity: u64,
        /// Number of cache sets
        #[arg(value_name = "S")]
        sets: u64,
        /// Number of epochs
        #[arg(value_name = "R")]
        epochs: u64,
        /// Advantage of the rekeying function over R epochs
        #[arg(value_name = "Adv_rekey_R")]
        adv_rekey: f64,
        /// Maximum number of accesses per epoch
        #[arg(value_name = "N1")]
        period_ceiling: u64,
        /// Advantage of the cache randomizer within one epoch
        #[arg(value_name = "Adv_rand_N1")]
        adv_rand: f64,
        /// Target advantage for the whole schedule
        #[arg(value_name = "Adv_ME")]
        adv_me: f64,
    },
    /// Epoch count R <= R1 and period N maximizing R*N, printed as [N, R*N]
    MultiOptimal {
        /// Associativity of the cache
        #[arg(value_name = "a")]
        associativity: u64,
        /// Number of cache sets
        #[arg(value_name = "S")]
        sets: u64,
        /// Maximum number of epochs
        #[arg(value_name = "R1")]
        epoch_ceiling: u64,
        /// Advantage of the rekeying function over R1 epochs
        #[arg(value_name = "Adv_rekey_R1")]
        adv_rekey: f64,
        /// Maximum number of accesses per epoch
        #[arg(value_name = "N1")]
        period_ceiling: u64,
        /// Advantage of the cache randomizer within one epoch
        #[arg(value_name = "Adv_rand_N1")]
        adv_rand: f64,
        /// Target advantage for the whole schedule
        #[arg(value_name = "Adv_ME")]
        adv_me: f64,
    },
}

/// Result of one subcommand: the stdout echo, the report line, and where the
/// report goes unless --output overrides it.
struct Outcome {
    stdout: String,
    record: String,
    default_path: &'static str,
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let outcome = run(cli.command)?;

    println!("{}", outcome.stdout);

    let path = cli
        .output
        .unwrap_or_else(|| PathBuf::from(outcome.default_path));
    fs::write(&path, &outcome.record)
        .wrap_err_with(|| format!("failed to write report to {}", path.display()))?;
    info!(path = %path.display(), "report written");
    Ok(())
}

fn run(command: Command) -> eyre::Result<Outcome> {
    match command {
        Command::Single {
            associativity,
            sets,
            adv,
        } => {
            let geometry = CacheGeometry::new(associativity, sets)?;
            let period = rekeying_period(geometry, adv)?;
            info!(associativity, sets, adv, period, "single-epoch search done");
            Ok(Outcome {
                stdout: period.to_string(),
                record: single_record(associativity, sets, adv, period),
                default_path: "rk_single.out",
            })
        }
        Command::SingleNoise {
            associativity,
            sets,
            adv,
            rho,
        } => {
            let geometry = CacheGeometry::new(associativity, sets)?;
            let period = noisy_rekeying_period(geometry, adv, rho)?;
            info!(associativity, sets, adv, rho, period, "noisy search done");
            Ok(Outcome {
                stdout: period.to_string(),
                record: single_noise_record(associativity, sets, adv, rho, period),
                default_path: "rk_single_noise.out",
            })
        }
        Command::MultiFixed {
            associativity,
            sets,
            epochs,
            adv_rekey,
            period_ceiling,
            adv_rand,
            adv_me,
        } => {
            let geometry = CacheGeometry::new(associativity, sets)?;
            let budget = EpochBudget {
                rekey_advantage: adv_rekey,
                randomizer_advantage: adv_rand,
                target_advantage: adv_me,
                period_ceiling,
            };
            let schedule = fixed_epoch_schedule(geometry, epochs, budget)?;
            info!(
                associativity,
                sets,
                epochs,
                period = schedule.period,
                total = schedule.total_accesses,
                "fixed-epoch search done"
            );
            Ok(Outcome {
                stdout: format!("[{}, {}]", schedule.period, schedule.total_accesses),
                record: multi_record(
                    "R", associativity, sets, epochs, adv_rekey, period_ceiling, adv_rand, adv_me,
                    schedule.period, schedule.total_accesses,
                ),
                default_path: "rk_multi_fixed.out",
            })
        }
        Command::MultiOptimal {
            associativity,
            sets,
            epoch_ceiling,
            adv_rekey,
            period_ceiling,
            adv_rand,
            adv_me,
        } => {
            let geometry = CacheGeometry::new(associativity, sets)?;
            let budget = EpochBudget {
                rekey_advantage: adv_rekey,
                randomizer_advantage: adv_rand,
                target_advantage: adv_me,
                period_ceiling,
            };
            let schedule = optimal_epoch_schedule(geometry, epoch_ceiling, budget)?;
            info!(
                associativity,
                sets,
                epochs = schedule.epochs,
                period = schedule.period,
                total = schedule.total_accesses,
                "optimal-epoch search done"
            );
            Ok(Outcome {
                stdout: format!("[{}, {}]", schedule.period, schedule.total_accesses),
                record: multi_record(
                    "R1",
                    associativity,
                    sets,
                    epoch_ceiling,
                    adv_rekey,
                    period_ceiling,
                    adv_rand,
                    adv_me,
                    schedule.period,
                    schedule.total_accesses,
                ),
                default_path: "rk_multi_optimal.out",
            })
        }
    }
}

fn single_record(a: u64, s: u64, adv: f64, period: u64) -> String {
    format!(
        "(a={}, S={}, p={}) -> N={}\n",
        a,
        s,
        round_to(adv, 3),
        period
    )
}

fn single_noise_record(a: u64, s: u64, adv: f64, rho: f64, period: u64) -> String {
    format!(
        "(a={}, S={}, p={}, rho={}) -> N={}\n",
        a,
        s,
        round_to(adv, 3),
        round_to(rho, 3),
        period
    )
}

#[allow(clippy::too_many_arguments)]
fn multi_record(
    epoch_label: &str,
    a: u64,
    s: u64,
    epochs: u64,
    adv_rekey: f64,
    period_ceiling: u64,
    adv_rand: f64,
    adv_me: f64,
    period: u64,
    total: u64,
) -> String {
    format!(
        "(a={}, S={}, {}={}, p_rekey_{}={}, N'={}, p_rand_N'={}, p_ME={}) -> [N,R*N]=[{}, {}]\n",
        a,
        s,
        epoch_label,
        epochs,
        epoch_label,
        round_to(adv_rekey, 5),
        period_ceiling,
        round_to(adv_rand, 5),
        round_to(adv_me, 3),
        period,
        total
    )
}

fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.0123456, 3), 0.012);
        assert_eq!(round_to(0.01, 3), 0.01);
        assert_eq!(round_to(0.9999, 3), 1.0);
    }

    #[test]
    fn test_single_record_format() {
        assert_eq!(
            single_record(16, 12288, 0.01, 4224),
            "(a=16, S=12288, p=0.01) -> N=4224\n"
        );
    }

    #[test]
    fn test_multi_record_format() {
        let record = multi_record("R1", 16, 12288, 10, 0.00001, 80000, 0.004, 0.05, 73728, 737280);
        assert_eq!(
            record,
            "(a=16, S=12288, R1=10, p_rekey_R1=0.00001, N'=80000, p_rand_N'=0.004, p_ME=0.05) -> [N,R*N]=[73728, 737280]\n"
        );
    }
}
