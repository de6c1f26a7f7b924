//! Side-dish recommendation engine
//!
//! Scores candidate dishes against what the user already has, keeps at most one
//! representative per constrained category, tops the result up to the requested
//! count and orders it by score or store distance.

mod engine;
mod fill;
mod quota;
mod ranking;
mod scoring;
mod types;

pub use engine::RecommendationEngine;
pub use fill::{fill_to_target, CandidateSampler, FillReport, PoolOrderSampler, SeededSampler};
pub use quota::{dedup_by_name, top_candidates, QuotaOutcome, QuotaSelector};
pub use ranking::{project, rank};
pub use scoring::{HeldProfile, ScoringEngine};
pub use types::*;

use crate::errors::ApplicationError;
use crate::geo::Coordinates;

/// Result type for recommendation operations
pub type RecommendationResult<T> = Result<T, ApplicationError>;

/// Requested count used when the caller sends nothing or a non-positive value
pub const DEFAULT_COUNT: usize = 5;

/// Fallback user location (Seoul National University station area)
pub const DEFAULT_LOCATION: Coordinates = Coordinates { latitude: 37.4783, longitude: 126.9516 };

/// Characteristic tag marking soup-style dishes
pub const SOUP_TAG: &str = "국물요리";

/// Characteristic tag marking vegan dishes
pub const VEGAN_TAG: &str = "비건";

/// Name suffix of pan-fried "jeon" dishes, limited to one per result
pub const JEON_SUFFIX: &str = "전";

/// Seed for the deterministic fill sampler
pub const DEFAULT_FILL_SEED: u64 = 42;

/// Weights for flavor/category contrast scoring alone
pub const SIMPLE_WEIGHTS: WeightTable = WeightTable {
    flavor_contrast: 3.0,
    flavor_match: 2.0,
    category_contrast: 3.0,
    ingredient_overlap: 0.0,
    ingredient_novel: 0.0,
    cooking_method_repeat: 0.0,
    cooking_method_novel: 0.0,
    category_repeat: 0.0,
    category_novel: 0.0,
    season_match: 2.0,
};

/// Weights when ingredient and cooking-method diversity are scored too
pub const RICH_WEIGHTS: WeightTable = WeightTable {
    flavor_contrast: 2.0,
    flavor_match: 1.0,
    category_contrast: 0.0,
    ingredient_overlap: 1.0,
    ingredient_novel: 2.0,
    cooking_method_repeat: 1.0,
    cooking_method_novel: 2.0,
    category_repeat: 1.0,
    category_novel: 2.0,
    season_match: 2.0,
};
