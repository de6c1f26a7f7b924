//! Backfill of under-quota results

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::types::*;

/// Chooses one candidate out of a non-empty eligible slice.
pub trait CandidateSampler {
    fn pick(&mut self, eligible: &[&ScoredCandidate]) -> usize;
}

/// Seeded pseudo-random choice. A fresh sampler per request keeps every
/// computation reproducible and independent of other requests.
#[derive(Debug, Clone)]
pub struct SeededSampler {
    rng: StdRng,
}

impl SeededSampler {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl CandidateSampler for SeededSampler {
    fn pick(&mut self, eligible: &[&ScoredCandidate]) -> usize {
        self.rng.gen_range(0..eligible.len())
    }
}

/// Always the first eligible candidate in pool order.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolOrderSampler;

impl CandidateSampler for PoolOrderSampler {
    fn pick(&mut self, _eligible: &[&ScoredCandidate]) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillReport {
    pub added: usize,
    /// The pool ran out of new names before reaching the target
    pub exhausted: bool,
}

/// Appends candidates from `pool` whose names are not yet in `result` until
/// `result` holds `target` dishes or nothing eligible is left.
pub fn fill_to_target(
    result: &mut Vec<ScoredCandidate>,
    pool: &[ScoredCandidate],
    target: usize,
    sampler: &mut dyn CandidateSampler,
) -> FillReport {
    let mut report = FillReport::default();
    let mut present: HashSet<String> = result.iter().map(|candidate| candidate.dish.name.clone()).collect();

    while result.len() < target {
        let eligible: Vec<&ScoredCandidate> =
            pool.iter().filter(|candidate| !present.contains(&candidate.dish.name)).collect();

        if eligible.is_empty() {
            warn!(
                event_name = "recommendation.fill.exhausted",
                have = result.len(),
                target,
                "no more unique candidates to fill recommendations"
            );
            report.exhausted = true;
            break;
        }

        let index = sampler.pick(&eligible).min(eligible.len() - 1);
        let chosen = eligible[index].clone();
        debug!(event_name = "recommendation.fill.pick", dish = %chosen.dish.name, "backfilled candidate");

        present.insert(chosen.dish.name.clone());
        result.push(chosen);
        report.added += 1;
    }

    report
}
