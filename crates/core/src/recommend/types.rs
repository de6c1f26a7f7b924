//! Types for the Recommendation Engine

use serde::{Deserialize, Serialize};

use crate::domain::dish::Dish;
use crate::geo::Coordinates;

/// Request for side-dish recommendations
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionRequest {
    /// Names of dishes the user already has, in the order given
    pub held_dishes: Vec<String>,
    /// Requested result size as sent by the caller; normalized by the engine
    pub count: Option<i64>,
    /// Whether one soup-style dish may be recommended
    pub include_soup: bool,
    /// Season the user is shopping for
    pub season: Option<String>,
    /// Restrict candidates to vegan-tagged dishes
    pub vegan_only: bool,
    /// User location; the configured fallback is used when absent
    pub location: Option<Coordinates>,
    /// Id scoping this request's log events; generated when absent
    pub correlation_id: Option<String>,
}

impl SelectionRequest {
    pub fn new() -> Self {
        Self {
            held_dishes: Vec::new(),
            count: None,
            include_soup: true,
            season: None,
            vegan_only: false,
            location: None,
            correlation_id: None,
        }
    }

    pub fn with_held_dishes<I, S>(mut self, dishes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.held_dishes = dishes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_count(mut self, count: i64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_include_soup(mut self, include_soup: bool) -> Self {
        self.include_soup = include_soup;
        self
    }

    pub fn with_season(mut self, season: impl Into<String>) -> Self {
        self.season = Some(season.into());
        self
    }

    pub fn with_vegan_only(mut self, vegan_only: bool) -> Self {
        self.vegan_only = vegan_only;
        self
    }

    pub fn with_location(mut self, location: Coordinates) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

impl Default for SelectionRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Which scoring signals are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMode {
    /// Flavor and category contrast against each held dish
    Simple,
    /// Contrast plus ingredient, cooking-method and category diversity
    Rich,
}

impl ScoringMode {
    pub fn default_weights(&self) -> WeightTable {
        match self {
            ScoringMode::Simple => super::SIMPLE_WEIGHTS,
            ScoringMode::Rich => super::RICH_WEIGHTS,
        }
    }
}

/// Final ordering of the selected dishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingPolicy {
    /// Score descending, closer store first on ties
    ScoreFirst,
    /// Distance ascending only
    DistanceFirst,
}

/// Behavior when the user has no held dishes and no season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColdStartPolicy {
    /// Run the normal pipeline without personalization signals
    Score,
    /// Pick and rank the nearest dishes
    Nearest,
}

/// How the fill stage chooses extra candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    /// Seeded pseudo-random pick among eligible candidates
    Seeded,
    /// First eligible candidate in catalog order
    PoolOrder,
}

/// Order used to pick quota representatives and the remainder top-K
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrder {
    ByScore,
    ByDistance,
}

/// Which request flow produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    Personalized,
    ColdStart,
}

/// Additive weights for every scoring rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightTable {
    /// Per held dish, candidate flavor differs
    pub flavor_contrast: f64,
    /// Per held dish, candidate flavor matches
    pub flavor_match: f64,
    /// Per held dish, candidate category is not held at all
    pub category_contrast: f64,
    /// Candidate shares a main ingredient with the held set
    pub ingredient_overlap: f64,
    /// Candidate shares no main ingredient with the held set
    pub ingredient_novel: f64,
    pub cooking_method_repeat: f64,
    pub cooking_method_novel: f64,
    pub category_repeat: f64,
    pub category_novel: f64,
    /// Candidate season equals the requested season
    pub season_match: f64,
}

impl Default for WeightTable {
    fn default() -> Self {
        super::SIMPLE_WEIGHTS
    }
}

/// Fields returned to the caller besides the dish name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub store_name: bool,
    pub price: bool,
    pub image_url: bool,
    pub distance: bool,
}

impl Default for Projection {
    fn default() -> Self {
        Self { store_name: true, price: true, image_url: true, distance: true }
    }
}

/// A dish grouping limited to a single representative in the output
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstrainedCategory {
    /// Dishes carrying a characteristic tag
    Tagged(String),
    /// Dishes whose name ends with a reserved suffix
    NameSuffix(String),
}

impl ConstrainedCategory {
    pub fn matches(&self, dish: &Dish) -> bool {
        match self {
            ConstrainedCategory::Tagged(tag) => dish.has_tag(tag),
            ConstrainedCategory::NameSuffix(suffix) => dish.has_suffix(suffix),
        }
    }

    pub fn label(&self) -> String {
        match self {
            ConstrainedCategory::Tagged(tag) => format!("tag:{tag}"),
            ConstrainedCategory::NameSuffix(suffix) => format!("suffix:{suffix}"),
        }
    }
}

/// Engine configuration: weights, active signals, and output policies
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationConfig {
    pub scoring_mode: ScoringMode,
    pub weights: WeightTable,
    pub ranking_policy: RankingPolicy,
    pub cold_start: ColdStartPolicy,
    pub fill_rule: FillRule,
    pub fill_seed: u64,
    pub default_count: usize,
    pub default_location: Coordinates,
    pub soup_tag: String,
    pub vegan_tag: String,
    pub reserved_suffixes: Vec<String>,
    pub projection: Projection,
}

impl RecommendationConfig {
    /// Switches scoring mode and resets the weights to that mode's table.
    pub fn with_scoring_mode(mut self, mode: ScoringMode) -> Self {
        self.scoring_mode = mode;
        self.weights = mode.default_weights();
        self
    }

    pub fn with_ranking_policy(mut self, policy: RankingPolicy) -> Self {
        self.ranking_policy = policy;
        self
    }

    pub fn with_cold_start(mut self, policy: ColdStartPolicy) -> Self {
        self.cold_start = policy;
        self
    }

    pub fn with_fill_rule(mut self, rule: FillRule) -> Self {
        self.fill_rule = rule;
        self
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            scoring_mode: ScoringMode::Simple,
            weights: super::SIMPLE_WEIGHTS,
            ranking_policy: RankingPolicy::ScoreFirst,
            cold_start: ColdStartPolicy::Score,
            fill_rule: FillRule::Seeded,
            fill_seed: super::DEFAULT_FILL_SEED,
            default_count: super::DEFAULT_COUNT,
            default_location: super::DEFAULT_LOCATION,
            soup_tag: super::SOUP_TAG.to_owned(),
            vegan_tag: super::VEGAN_TAG.to_owned(),
            reserved_suffixes: vec![super::JEON_SUFFIX.to_owned()],
            projection: Projection::default(),
        }
    }
}

/// Per-rule score contributions for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreComponents {
    pub flavor: f64,
    pub category: f64,
    pub ingredient: f64,
    pub cooking_method: f64,
    pub season: f64,
}

impl ScoreComponents {
    pub fn total(&self) -> f64 {
        self.flavor + self.category + self.ingredient + self.cooking_method + self.season
    }
}

/// A candidate dish annotated for one recommendation computation
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub dish: Dish,
    pub score: f64,
    pub components: ScoreComponents,
    /// Kilometers from the user, `f64::INFINITY` when unknown
    pub distance_km: f64,
}

impl ScoredCandidate {
    pub fn new(dish: Dish, distance_km: f64) -> Self {
        Self { dish, score: 0.0, components: ScoreComponents::default(), distance_km }
    }

    pub fn name(&self) -> &str {
        &self.dish.name
    }
}

/// One recommended dish as exposed to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

/// Result of one recommendation computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationOutcome {
    pub correlation_id: String,
    pub flow: Flow,
    pub requested: usize,
    pub under_filled: bool,
    pub recommendations: Vec<Recommendation>,
}
