//! Run-level configuration: the static source table, the wall-clock budget
//! and the knobs the CLI or environment can turn.

use std::fmt;
use std::time::{Duration, Instant};

use crate::util::env::{env_opt, env_parse};

/// One entry of the source table. Order in [`SOURCES`] is harvest order.
#[derive(Debug, Clone, Copy)]
pub struct SourceSpec {
    pub key: &'static str,
    /// Exact number of records this source must contribute.
    pub quota: usize,
}

/// Fixed source order. Later sources see every identity accepted by earlier
/// ones, so ordering is part of the output contract.
pub const SOURCES: [SourceSpec; 3] = [
    SourceSpec { key: "steam", quota: 80 },
    SourceSpec { key: "gog", quota: 80 },
    SourceSpec { key: "gmg", quota: 50 },
];

/// Total records a complete run emits.
pub fn total_quota() -> usize {
    SOURCES.iter().map(|s| s.quota).sum()
}

/// Advisory wall-clock cutoff. Checked at batch and source boundaries only;
/// work already in flight is never preempted by it.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Instant);

impl Deadline {
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    pub fn passed(&self) -> bool {
        Instant::now() >= self.0
    }
}

/// What happens to fetch tasks still pending when the batch timeout fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StragglerPolicy {
    /// Cancel pending tasks; anything they produced is discarded.
    Abandon,
    /// Keep waiting for pending tasks and accept their late results.
    Drain,
}

impl fmt::Display for StragglerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StragglerPolicy::Abandon => write!(f, "abandon"),
            StragglerPolicy::Drain => write!(f, "drain"),
        }
    }
}

/// Everything one run needs beyond the static source table.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Admission gate width per source.
    pub concurrency: usize,
    pub deadline: Deadline,
    pub straggler_policy: StragglerPolicy,
    /// Upper bound on how long one batch may stay open.
    pub batch_timeout: Duration,
    /// Pause between consecutive batches of the same source.
    pub batch_pause: Duration,
    /// Seed discovery stops at `quota * seed_cap_factor` URLs.
    pub seed_cap_factor: usize,
    pub json_path: String,
    pub csv_path: String,
}

impl RunConfig {
    /// Build from CLI arguments, with env overrides for the quieter knobs.
    pub fn from_cli(timeout_secs: u64, concurrency: usize, straggler_policy: StragglerPolicy) -> Self {
        Self {
            concurrency: concurrency.max(1),
            deadline: Deadline::after(Duration::from_secs(timeout_secs)),
            straggler_policy,
            batch_timeout: Duration::from_secs(env_parse("BATCH_TIMEOUT_SECS", 30u64)),
            batch_pause: Duration::from_millis(env_parse("BATCH_PAUSE_MS", 500u64)),
            seed_cap_factor: env_parse("SEED_CAP_FACTOR", 6usize).max(1),
            json_path: env_opt("RESULTS_JSON").unwrap_or_else(|| "results.json".into()),
            csv_path: env_opt("RESULTS_CSV").unwrap_or_else(|| "results.csv".into()),
        }
    }
}
