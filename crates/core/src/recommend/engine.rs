//! Recommendation Engine implementation

use std::collections::HashSet;

use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::catalog::{load_dishes, DishCatalog};
use crate::domain::dish::Dish;
use crate::errors::{ApplicationError, DomainError};
use crate::geo::Coordinates;

use super::fill::{fill_to_target, CandidateSampler, FillReport, PoolOrderSampler, SeededSampler};
use super::quota::{dedup_by_name, top_candidates, QuotaOutcome, QuotaSelector};
use super::ranking::{project, rank};
use super::scoring::{HeldProfile, ScoringEngine};
use super::types::*;
use super::RecommendationResult;

/// Request values after defaults have been applied.
#[derive(Debug, Clone)]
struct NormalizedRequest {
    count: usize,
    season: Option<String>,
    location: Coordinates,
    flow: Flow,
}

/// Scoring, quota selection, backfill and ranking behind one entry point.
///
/// The engine holds configuration only. Every call works on its own copy of
/// the catalog, so one engine can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    config: RecommendationConfig,
    scoring: ScoringEngine,
}

impl RecommendationEngine {
    pub fn new(config: RecommendationConfig) -> Self {
        let scoring = ScoringEngine::with_weights(config.scoring_mode, config.weights);
        Self { config, scoring }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Fetches a fresh table from `catalog` and recommends from it.
    pub fn recommend(
        &self,
        request: &SelectionRequest,
        catalog: &dyn DishCatalog,
    ) -> RecommendationResult<RecommendationOutcome> {
        let correlation_id = correlation_id_for(request);
        let span = info_span!("recommendation", correlation_id = %correlation_id);
        let _entered = span.enter();

        let dishes = load_dishes(catalog).map_err(|error| {
            error!(
                event_name = "recommendation.catalog.failed",
                error = %error,
                "failed to load dish catalog"
            );
            error
        })?;

        self.run(request, &dishes, correlation_id)
    }

    /// Recommends from an already materialized table.
    pub fn recommend_from(
        &self,
        request: &SelectionRequest,
        dishes: &[Dish],
    ) -> RecommendationResult<RecommendationOutcome> {
        let correlation_id = correlation_id_for(request);
        let span = info_span!("recommendation", correlation_id = %correlation_id);
        let _entered = span.enter();

        self.run(request, dishes, correlation_id)
    }

    fn run(
        &self,
        request: &SelectionRequest,
        dishes: &[Dish],
        correlation_id: String,
    ) -> RecommendationResult<RecommendationOutcome> {
        debug!(
            event_name = "recommendation.request.received",
            held_dishes = ?request.held_dishes,
            count = ?request.count,
            include_soup = request.include_soup,
            season = ?request.season,
            vegan_only = request.vegan_only,
            catalog_rows = dishes.len(),
            "received recommendation request"
        );

        self.compute(request, dishes, correlation_id).map_err(|error| {
            error!(
                event_name = "recommendation.failed",
                error = %error,
                held_dishes = ?request.held_dishes,
                "recommendation computation failed"
            );
            ApplicationError::from(error)
        })
    }

    fn compute(
        &self,
        request: &SelectionRequest,
        dishes: &[Dish],
        correlation_id: String,
    ) -> Result<RecommendationOutcome, DomainError> {
        let held_names: HashSet<&str> = request
            .held_dishes
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        let plan = self.normalize(request, !held_names.is_empty());

        let held = HeldProfile::from_dishes(
            dishes.iter().filter(|dish| held_names.contains(dish.name.as_str())),
        );

        let mut pool: Vec<ScoredCandidate> = dishes
            .iter()
            .filter(|dish| !held_names.contains(dish.name.as_str()))
            .filter(|dish| !request.vegan_only || dish.has_tag(&self.config.vegan_tag))
            .map(|dish| {
                let distance = plan.location.distance_to(dish.latitude, dish.longitude);
                ScoredCandidate::new(dish.clone(), distance)
            })
            .collect();

        let nearest_first =
            plan.flow == Flow::ColdStart && self.config.cold_start == ColdStartPolicy::Nearest;
        let (order, ranking) = if nearest_first {
            (SelectionOrder::ByDistance, RankingPolicy::DistanceFirst)
        } else {
            self.scoring.score_pool(&mut pool, &held, plan.season.as_deref())?;
            (SelectionOrder::ByScore, self.config.ranking_policy)
        };

        let selector = self.quota_selector(request.include_soup);
        let pool = selector.exclude(pool);
        let QuotaOutcome { picks, remainder } = selector.select(pool, order);

        let remaining_slots = plan.count.saturating_sub(picks.len());
        let mut result = picks.clone();
        result.extend(top_candidates(&remainder, remaining_slots, order));
        let mut result = dedup_by_name(result);
        result.truncate(plan.count);

        let fill = if result.len() < plan.count {
            let mut sampler = self.sampler();
            fill_to_target(&mut result, &remainder, plan.count, sampler.as_mut())
        } else {
            FillReport::default()
        };

        selector.enforce(&mut result, &picks);
        rank(&mut result, ranking);

        let under_filled = result.len() < plan.count;
        if under_filled {
            warn!(
                event_name = "recommendation.under_filled",
                requested = plan.count,
                returned = result.len(),
                backfilled = fill.added,
                "fewer eligible dishes than requested"
            );
        }
        debug!(
            event_name = "recommendation.completed",
            returned = result.len(),
            quota_picks = picks.len(),
            backfilled = fill.added,
            "recommendation computed"
        );

        Ok(RecommendationOutcome {
            correlation_id,
            flow: plan.flow,
            requested: plan.count,
            under_filled,
            recommendations: project(&result, &self.config.projection),
        })
    }

    fn normalize(&self, request: &SelectionRequest, has_held: bool) -> NormalizedRequest {
        let count = match request.count {
            None => self.config.default_count,
            Some(count) if count > 0 => {
                usize::try_from(count).unwrap_or(self.config.default_count)
            }
            Some(count) => {
                warn!(
                    event_name = "recommendation.request.invalid_count",
                    count,
                    default = self.config.default_count,
                    "invalid recommendation count, using default"
                );
                self.config.default_count
            }
        };

        let season = request
            .season
            .as_deref()
            .map(str::trim)
            .filter(|season| !season.is_empty())
            .map(str::to_owned);

        let flow = if !has_held && season.is_none() {
            info!(
                event_name = "recommendation.cold_start",
                policy = ?self.config.cold_start,
                "no held dishes or season provided, using cold-start flow"
            );
            Flow::ColdStart
        } else {
            Flow::Personalized
        };

        NormalizedRequest {
            count,
            season,
            location: request.location.unwrap_or(self.config.default_location),
            flow,
        }
    }

    fn quota_selector(&self, include_soup: bool) -> QuotaSelector {
        let soup = ConstrainedCategory::Tagged(self.config.soup_tag.clone());
        let suffixes = self
            .config
            .reserved_suffixes
            .iter()
            .map(|suffix| ConstrainedCategory::NameSuffix(suffix.clone()));

        if include_soup {
            QuotaSelector::new(std::iter::once(soup).chain(suffixes).collect(), Vec::new())
        } else {
            QuotaSelector::new(suffixes.collect(), vec![soup])
        }
    }

    fn sampler(&self) -> Box<dyn CandidateSampler> {
        match self.config.fill_rule {
            FillRule::Seeded => Box::new(SeededSampler::new(self.config.fill_seed)),
            FillRule::PoolOrder => Box::new(PoolOrderSampler),
        }
    }
}

/// Caller-supplied id when present so failures can be traced end to end.
fn correlation_id_for(request: &SelectionRequest) -> String {
    request.correlation_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string())
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(RecommendationConfig::default())
    }
}
