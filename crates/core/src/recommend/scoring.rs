//! Rule-weighted scoring of candidate dishes

use std::collections::{BTreeSet, HashSet};

use crate::domain::dish::Dish;
use crate::errors::DomainError;

use super::types::*;

/// Attributes of the dishes a user already holds, collected once per request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeldProfile {
    /// One entry per held dish, in request order
    pub flavors: Vec<Option<String>>,
    pub categories: BTreeSet<String>,
    pub main_ingredients: BTreeSet<String>,
    pub cooking_methods: BTreeSet<String>,
}

impl HeldProfile {
    /// Builds the profile from held rows, counting each dish name once.
    pub fn from_dishes<'a>(held: impl IntoIterator<Item = &'a Dish>) -> Self {
        let mut profile = Self::default();
        let mut seen = HashSet::new();

        for dish in held {
            if !seen.insert(dish.name.as_str()) {
                continue;
            }
            profile.flavors.push(dish.flavor.clone());
            profile.categories.extend(dish.category.iter().cloned());
            profile.main_ingredients.extend(dish.main_ingredients.iter().cloned());
            profile.cooking_methods.extend(dish.cooking_method.iter().cloned());
        }

        profile
    }

    pub fn is_empty(&self) -> bool {
        self.flavors.is_empty()
    }

    pub fn dish_count(&self) -> usize {
        self.flavors.len()
    }
}

/// Applies the additive scoring rules to a candidate pool
#[derive(Debug, Clone)]
pub struct ScoringEngine {
    weights: WeightTable,
    mode: ScoringMode,
}

impl ScoringEngine {
    pub fn new(mode: ScoringMode) -> Self {
        Self { weights: mode.default_weights(), mode }
    }

    pub fn with_weights(mode: ScoringMode, weights: WeightTable) -> Self {
        Self { weights, mode }
    }

    pub fn weights(&self) -> &WeightTable {
        &self.weights
    }

    /// Annotates every candidate with its score. Scores start from zero, so
    /// scoring the same pool twice gives the same result.
    pub fn score_pool(
        &self,
        pool: &mut [ScoredCandidate],
        held: &HeldProfile,
        season: Option<&str>,
    ) -> Result<(), DomainError> {
        for candidate in pool.iter_mut() {
            let components = self.score_components(&candidate.dish, held, season);
            let score = components.total();
            if !score.is_finite() {
                return Err(DomainError::NonFiniteScore { name: candidate.dish.name.clone() });
            }
            candidate.components = components;
            candidate.score = score;
        }
        Ok(())
    }

    /// Score contributions of a single candidate.
    pub fn score_components(
        &self,
        candidate: &Dish,
        held: &HeldProfile,
        season: Option<&str>,
    ) -> ScoreComponents {
        let mut components = ScoreComponents::default();

        components.flavor = self.flavor_contrast_score(candidate, held);
        components.category = self.category_contrast_score(candidate, held);

        if self.mode == ScoringMode::Rich {
            components.ingredient = self.ingredient_diversity_score(candidate, held);
            components.cooking_method = self.cooking_method_diversity_score(candidate, held);
            components.category += self.category_diversity_score(candidate, held);
        }

        components.season = self.season_score(candidate, season);
        components
    }

    /// Once per held dish: a different flavor earns more than a repeat.
    fn flavor_contrast_score(&self, candidate: &Dish, held: &HeldProfile) -> f64 {
        held.flavors
            .iter()
            .map(|held_flavor| {
                let same = matches!(
                    (candidate.flavor.as_ref(), held_flavor.as_ref()),
                    (Some(a), Some(b)) if a == b
                );
                if same {
                    self.weights.flavor_match
                } else {
                    self.weights.flavor_contrast
                }
            })
            .sum()
    }

    /// Once per held dish when the candidate's category is not held at all.
    fn category_contrast_score(&self, candidate: &Dish, held: &HeldProfile) -> f64 {
        if held.is_empty() || !is_new(candidate.category.as_ref(), &held.categories) {
            return 0.0;
        }
        self.weights.category_contrast * held.dish_count() as f64
    }

    fn ingredient_diversity_score(&self, candidate: &Dish, held: &HeldProfile) -> f64 {
        if held.is_empty() {
            return 0.0;
        }
        if candidate.shares_ingredient_with(&held.main_ingredients) {
            self.weights.ingredient_overlap
        } else {
            self.weights.ingredient_novel
        }
    }

    fn cooking_method_diversity_score(&self, candidate: &Dish, held: &HeldProfile) -> f64 {
        if is_new(candidate.cooking_method.as_ref(), &held.cooking_methods) {
            self.weights.cooking_method_novel
        } else {
            self.weights.cooking_method_repeat
        }
    }

    fn category_diversity_score(&self, candidate: &Dish, held: &HeldProfile) -> f64 {
        if is_new(candidate.category.as_ref(), &held.categories) {
            self.weights.category_novel
        } else {
            self.weights.category_repeat
        }
    }

    fn season_score(&self, candidate: &Dish, season: Option<&str>) -> f64 {
        match (season, candidate.season.as_deref()) {
            (Some(wanted), Some(actual)) if wanted == actual => self.weights.season_match,
            _ => 0.0,
        }
    }
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(ScoringMode::Simple)
    }
}

/// Unknown attributes count as new, so they never collide with held values.
fn is_new(value: Option<&String>, held: &BTreeSet<String>) -> bool {
    value.map_or(true, |value| !held.contains(value))
}
