//! Per-source harvest: turns seed URLs into exactly `quota` records through
//! batched concurrent fetching, identity dedup and synthetic backfill.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::{RunConfig, StragglerPolicy};
use crate::dedup::DedupIndex;
use crate::discover::discover_seeds;
use crate::fetch::PageFetcher;
use crate::normalization::normalize_name;
use crate::record::GameRecord;
use crate::sources::Site;
use crate::synth::SyntheticGenerator;

/// Why a fetch task produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The fetcher spent its whole retry budget.
    NoContent,
    /// The run deadline passed before the task issued its request.
    DeadlinePassed,
    /// The batch closed while the task was still pending.
    BatchTimeout,
}

/// Typed result of one fetch+extract task. The reducer folds these into the
/// accepted list; nothing else inspects them.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A complete record extracted from a live page.
    Success(GameRecord),
    /// The page loaded but held no usable item.
    Invalid,
    /// The task never reached extraction.
    Skipped(SkipReason),
}

/// Counting gate bounding simultaneously outstanding fetches, with a
/// high-water mark for end-of-source reporting.
pub(crate) struct AdmissionGate {
    sem: Arc<Semaphore>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl AdmissionGate {
    pub(crate) fn new(limit: usize) -> Arc<Self> {
        Arc::new(Self {
            sem: Arc::new(Semaphore::new(limit.max(1))),
            in_flight: AtomicUsize::new(0),
            high_water: AtomicUsize::new(0),
        })
    }

    /// One slot per outstanding fetch; the slot frees itself on drop.
    pub(crate) async fn admit(self: &Arc<Self>) -> AdmissionSlot {
        let permit = self.sem.clone().acquire_owned().await.unwrap();
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.high_water.fetch_max(now, Ordering::SeqCst);
        AdmissionSlot {
            gate: Arc::clone(self),
            _permit: permit,
        }
    }

    pub(crate) fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }
}

pub(crate) struct AdmissionSlot {
    gate: Arc<AdmissionGate>,
    _permit: OwnedSemaphorePermit,
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Fold counters for one source, logged when the source completes.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    pub real: usize,
    pub synthetic: usize,
    pub duplicates: usize,
    pub invalid: usize,
    pub no_content: usize,
    pub deadline_skips: usize,
    pub abandoned: usize,
    pub gate_high_water: usize,
    pub faulted: bool,
}

pub struct HarvestOutput {
    pub records: Vec<GameRecord>,
    pub stats: HarvestStats,
}

/// Harvest one source to exactly `quota` records.
///
/// Faults inside the harvest (a panicking worker, a poisoned join) degrade
/// to fully synthetic output instead of propagating; the quota holds either
/// way.
pub async fn harvest_source(
    site: &'static dyn Site,
    quota: usize,
    fetcher: Arc<dyn PageFetcher>,
    cfg: &RunConfig,
    index: &mut DedupIndex,
    synth: &mut SyntheticGenerator,
) -> HarvestOutput {
    match harvest_inner(site, quota, fetcher, cfg, index, synth).await {
        Ok(output) => output,
        Err(err) => {
            warn!(site = site.key(), %err, "harvest faulted; replacing output with synthetic records");
            let records = all_synthetic(site.key(), quota, index, synth);
            let stats = HarvestStats {
                synthetic: records.len(),
                faulted: true,
                ..Default::default()
            };
            HarvestOutput { records, stats }
        }
    }
}

/// Fill `quota` records from the generator alone, registering every identity
/// in the shared index so later sources cannot collide with them.
pub fn all_synthetic(
    site_key: &str,
    quota: usize,
    index: &mut DedupIndex,
    synth: &mut SyntheticGenerator,
) -> Vec<GameRecord> {
    let mut out = Vec::with_capacity(quota);
    while out.len() < quota {
        let record = synth.next_record(site_key, |id| index.contains(id));
        index.insert(normalize_name(&record.name));
        out.push(record);
    }
    out
}

async fn harvest_inner(
    site: &'static dyn Site,
    quota: usize,
    fetcher: Arc<dyn PageFetcher>,
    cfg: &RunConfig,
    index: &mut DedupIndex,
    synth: &mut SyntheticGenerator,
) -> anyhow::Result<HarvestOutput> {
    info!(site = site.key(), quota, "source starting");
    let mut stats = HarvestStats::default();

    let seed_cap = quota.saturating_mul(cfg.seed_cap_factor);
    let seeds = discover_seeds(site, fetcher.as_ref(), seed_cap).await;

    let mut accepted: Vec<GameRecord> = Vec::with_capacity(quota);
    let mut seen: HashSet<String> = HashSet::new();

    if seeds.is_empty() {
        warn!(site = site.key(), "no seeds discovered; output will be fully synthetic");
    } else {
        let gate = AdmissionGate::new(cfg.concurrency);
        let mut next_seed = 0usize;
        let mut attempted = 0usize;

        // Deadline and quota are only consulted between batches; work in
        // flight always runs to its own conclusion or the batch timeout.
        while accepted.len() < quota
            && next_seed < seeds.len()
            && attempted < seeds.len()
            && !cfg.deadline.passed()
        {
            let batch_size = (cfg.concurrency * 3).min(seeds.len() - next_seed);
            let batch = &seeds[next_seed..next_seed + batch_size];
            next_seed += batch_size;
            attempted += batch_size;

            let mut tasks: JoinSet<FetchOutcome> = JoinSet::new();
            for url in batch {
                let url = url.clone();
                let fetcher = Arc::clone(&fetcher);
                let gate = Arc::clone(&gate);
                let deadline = cfg.deadline;
                tasks.spawn(async move {
                    let _slot = gate.admit().await;
                    if deadline.passed() {
                        return FetchOutcome::Skipped(SkipReason::DeadlinePassed);
                    }
                    match fetcher.fetch_page(&url).await {
                        None => FetchOutcome::Skipped(SkipReason::NoContent),
                        Some(html) => match site.extract(&html) {
                            Some(item) => FetchOutcome::Success(GameRecord::from_extracted(
                                item,
                                site.key(),
                                url,
                            )),
                            None => FetchOutcome::Invalid,
                        },
                    }
                });
            }

            let outcomes = collect_batch(&mut tasks, cfg).await?;
            for outcome in outcomes {
                match outcome {
                    FetchOutcome::Success(record) => {
                        let identity = normalize_name(&record.name);
                        if seen.contains(&identity) || index.contains(&identity) {
                            stats.duplicates += 1;
                        } else {
                            seen.insert(identity.clone());
                            index.insert(identity);
                            accepted.push(record);
                        }
                    }
                    FetchOutcome::Invalid => stats.invalid += 1,
                    FetchOutcome::Skipped(SkipReason::NoContent) => stats.no_content += 1,
                    FetchOutcome::Skipped(SkipReason::DeadlinePassed) => stats.deadline_skips += 1,
                    FetchOutcome::Skipped(SkipReason::BatchTimeout) => stats.abandoned += 1,
                }
            }

            info!(
                site = site.key(),
                accepted = accepted.len(),
                quota,
                attempted,
                "batch folded"
            );
            if accepted.len() >= quota {
                break;
            }
            tokio::time::sleep(cfg.batch_pause).await;
        }
        stats.gate_high_water = gate.high_water_mark();
        if cfg.deadline.passed() && accepted.len() < quota {
            info!(
                site = site.key(),
                accepted = accepted.len(),
                "deadline reached; no more batches for this source"
            );
        }
    }

    stats.real = accepted.len().min(quota);

    if accepted.len() < quota {
        let missing = quota - accepted.len();
        info!(site = site.key(), missing, "backfilling to quota");
        while accepted.len() < quota {
            let record =
                synth.next_record(site.key(), |id| seen.contains(id) || index.contains(id));
            let identity = normalize_name(&record.name);
            seen.insert(identity.clone());
            index.insert(identity);
            accepted.push(record);
            stats.synthetic += 1;
        }
    }

    accepted.truncate(quota);
    info!(
        site = site.key(),
        real = stats.real,
        synthetic = stats.synthetic,
        duplicates = stats.duplicates,
        invalid = stats.invalid,
        no_content = stats.no_content,
        abandoned = stats.abandoned,
        gate_high_water = stats.gate_high_water,
        "source complete"
    );
    Ok(HarvestOutput {
        records: accepted,
        stats,
    })
}

/// Join one batch under the batch timeout. On timeout the straggler policy
/// decides whether pending tasks are cancelled or drained; results that were
/// already complete when the timeout fired are kept either way.
async fn collect_batch(
    tasks: &mut JoinSet<FetchOutcome>,
    cfg: &RunConfig,
) -> anyhow::Result<Vec<FetchOutcome>> {
    let closes_at = tokio::time::Instant::now() + cfg.batch_timeout;
    let mut outcomes = Vec::with_capacity(tasks.len());
    let mut timed_out = false;

    while !tasks.is_empty() {
        match tokio::time::timeout_at(closes_at, tasks.join_next()).await {
            Ok(Some(joined)) => outcomes.push(joined.context("fetch task panicked")?),
            Ok(None) => break,
            Err(_) => {
                timed_out = true;
                break;
            }
        }
    }
    if !timed_out {
        return Ok(outcomes);
    }

    match cfg.straggler_policy {
        StragglerPolicy::Abandon => {
            warn!(pending = tasks.len(), "batch timeout; abandoning pending fetches");
            tasks.abort_all();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    // Finished between the timeout and the abort: the result
                    // is discarded all the same. Late work is never consulted.
                    Ok(_) => outcomes.push(FetchOutcome::Skipped(SkipReason::BatchTimeout)),
                    Err(err) if err.is_cancelled() => {
                        outcomes.push(FetchOutcome::Skipped(SkipReason::BatchTimeout))
                    }
                    Err(err) => return Err(err).context("fetch task panicked"),
                }
            }
        }
        StragglerPolicy::Drain => {
            warn!(pending = tasks.len(), "batch timeout; draining pending fetches");
            while let Some(joined) = tasks.join_next().await {
                outcomes.push(joined.context("fetch task panicked")?);
            }
        }
    }
    Ok(outcomes)
}
