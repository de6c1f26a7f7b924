//! Constrained-category quotas: at most one representative per category

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{debug, warn};

use super::types::*;

/// Representatives chosen for constrained categories plus everything else
#[derive(Debug, Clone, Default)]
pub struct QuotaOutcome {
    pub picks: Vec<ScoredCandidate>,
    /// Unconstrained candidates in their original pool order
    pub remainder: Vec<ScoredCandidate>,
}

/// Enforces "pick one" categories and removes fully excluded ones
#[derive(Debug, Clone, Default)]
pub struct QuotaSelector {
    constrained: Vec<ConstrainedCategory>,
    excluded: Vec<ConstrainedCategory>,
}

impl QuotaSelector {
    pub fn new(constrained: Vec<ConstrainedCategory>, excluded: Vec<ConstrainedCategory>) -> Self {
        Self { constrained, excluded }
    }

    pub fn constrained(&self) -> &[ConstrainedCategory] {
        &self.constrained
    }

    /// Drops every member of an excluded category. Runs before any ranking.
    pub fn exclude(&self, mut pool: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        if self.excluded.is_empty() {
            return pool;
        }
        pool.retain(|candidate| !self.excluded.iter().any(|category| category.matches(&candidate.dish)));
        pool
    }

    /// Picks the best member of each constrained category, then removes all of
    /// that category's members from the pool. Ties keep pool order. A pick that
    /// also matches a later category represents that category too.
    pub fn select(&self, mut pool: Vec<ScoredCandidate>, order: SelectionOrder) -> QuotaOutcome {
        let mut picks: Vec<ScoredCandidate> = Vec::new();

        for category in &self.constrained {
            if let Some(shared) = picks.iter().find(|pick| category.matches(&pick.dish)) {
                debug!(
                    event_name = "recommendation.quota.shared",
                    category = %category.label(),
                    dish = %shared.dish.name,
                    "earlier pick already represents this category"
                );
                pool.retain(|candidate| !category.matches(&candidate.dish));
                continue;
            }

            let mut best: Option<&ScoredCandidate> = None;
            for candidate in pool.iter().filter(|candidate| category.matches(&candidate.dish)) {
                let better = match best {
                    None => true,
                    Some(current) => selection_cmp(candidate, current, order) == Ordering::Less,
                };
                if better {
                    best = Some(candidate);
                }
            }

            if let Some(best) = best.cloned() {
                debug!(
                    event_name = "recommendation.quota.pick",
                    category = %category.label(),
                    dish = %best.dish.name,
                    score = best.score,
                    "constrained category representative selected"
                );
                picks.push(best);
            }
            pool.retain(|candidate| !category.matches(&candidate.dish));
        }

        QuotaOutcome { picks, remainder: pool }
    }

    /// Re-checks the result after backfill: each constrained category keeps its
    /// original representative (or its first member when none was picked) and
    /// excluded categories keep nothing.
    pub fn enforce(&self, result: &mut Vec<ScoredCandidate>, picks: &[ScoredCandidate]) {
        let before = result.len();
        result.retain(|candidate| !self.excluded.iter().any(|category| category.matches(&candidate.dish)));

        for category in &self.constrained {
            let chosen = picks
                .iter()
                .find(|pick| category.matches(&pick.dish))
                .map(|pick| pick.dish.name.clone())
                .filter(|name| result.iter().any(|candidate| candidate.dish.name == *name))
                .or_else(|| {
                    result
                        .iter()
                        .find(|candidate| category.matches(&candidate.dish))
                        .map(|candidate| candidate.dish.name.clone())
                });

            let Some(chosen) = chosen else {
                continue;
            };
            result.retain(|candidate| {
                !category.matches(&candidate.dish) || candidate.dish.name == chosen
            });
        }

        let removed = before - result.len();
        if removed > 0 {
            warn!(
                event_name = "recommendation.quota.cleanup",
                removed,
                "constrained category violation after fill, extra members removed"
            );
        }
    }
}

/// Highest ranked `k` candidates, stable on ties.
pub fn top_candidates(
    candidates: &[ScoredCandidate],
    k: usize,
    order: SelectionOrder,
) -> Vec<ScoredCandidate> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| selection_cmp(a, b, order));
    sorted.truncate(k);
    sorted
}

/// Keeps the first occurrence of every dish name.
pub fn dedup_by_name(candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    let mut seen = HashSet::new();
    candidates.into_iter().filter(|candidate| seen.insert(candidate.dish.name.clone())).collect()
}

/// `Less` means `a` should be picked before `b`.
pub(crate) fn selection_cmp(a: &ScoredCandidate, b: &ScoredCandidate, order: SelectionOrder) -> Ordering {
    match order {
        SelectionOrder::ByScore => b.score.total_cmp(&a.score),
        SelectionOrder::ByDistance => a.distance_km.total_cmp(&b.distance_km),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dish::{Dish, DishRecord};

    fn candidate(name: &str, tags: &str, score: f64, distance_km: f64) -> ScoredCandidate {
        let dish = Dish::try_from(DishRecord {
            name: name.to_owned(),
            store_name: "봉천반찬".to_owned(),
            price: 3000,
            characteristics: Some(tags.to_owned()),
            ..DishRecord::default()
        })
        .expect("valid dish");
        ScoredCandidate { score, distance_km, ..ScoredCandidate::new(dish, distance_km) }
    }

    fn soup() -> ConstrainedCategory {
        ConstrainedCategory::Tagged("국물요리".to_owned())
    }

    fn jeon() -> ConstrainedCategory {
        ConstrainedCategory::NameSuffix("전".to_owned())
    }

    fn names(candidates: &[ScoredCandidate]) -> Vec<&str> {
        candidates.iter().map(ScoredCandidate::name).collect()
    }

    #[test]
    fn picks_highest_scoring_member_and_removes_the_rest() {
        let pool = vec![
            candidate("미역국", "국물요리", 4.0, 1.0),
            candidate("된장찌개", "국물요리", 6.0, 2.0),
            candidate("김치전", "", 5.0, 1.0),
            candidate("파전", "", 5.0, 1.0),
            candidate("장조림", "", 3.0, 1.0),
        ];
        let selector = QuotaSelector::new(vec![soup(), jeon()], Vec::new());

        let outcome = selector.select(pool, SelectionOrder::ByScore);

        // Tie between the two jeon dishes keeps pool order.
        assert_eq!(names(&outcome.picks), vec!["된장찌개", "김치전"]);
        assert_eq!(names(&outcome.remainder), vec!["장조림"]);
    }

    #[test]
    fn pick_matching_two_categories_represents_both() {
        let pool = vec![
            candidate("해물전", "국물요리", 9.0, 1.0),
            candidate("김치전", "", 8.0, 1.0),
            candidate("장조림", "", 3.0, 1.0),
        ];
        let selector = QuotaSelector::new(vec![soup(), jeon()], Vec::new());

        let outcome = selector.select(pool, SelectionOrder::ByScore);
        assert_eq!(names(&outcome.picks), vec!["해물전"]);
        assert_eq!(names(&outcome.remainder), vec!["장조림"]);

        let mut result = outcome.picks.clone();
        result.extend(outcome.remainder.clone());
        selector.enforce(&mut result, &outcome.picks);
        assert_eq!(names(&result), vec!["해물전", "장조림"]);
    }

    #[test]
    fn distance_order_picks_nearest_member() {
        let pool = vec![
            candidate("미역국", "국물요리", 9.0, 3.0),
            candidate("콩나물국", "국물요리", 1.0, 0.5),
        ];
        let selector = QuotaSelector::new(vec![soup()], Vec::new());

        let outcome = selector.select(pool, SelectionOrder::ByDistance);
        assert_eq!(names(&outcome.picks), vec!["콩나물국"]);
    }

    #[test]
    fn empty_category_picks_nothing() {
        let selector = QuotaSelector::new(vec![soup()], Vec::new());
        let outcome = selector.select(vec![candidate("장조림", "", 1.0, 1.0)], SelectionOrder::ByScore);
        assert!(outcome.picks.is_empty());
        assert_eq!(outcome.remainder.len(), 1);
    }

    #[test]
    fn excluded_category_is_removed_before_selection() {
        let selector = QuotaSelector::new(Vec::new(), vec![soup()]);
        let pool = selector.exclude(vec![
            candidate("미역국", "국물요리", 9.0, 1.0),
            candidate("장조림", "", 1.0, 1.0),
        ]);
        assert_eq!(names(&pool), vec!["장조림"]);
    }

    #[test]
    fn top_candidates_is_stable_on_ties() {
        let pool = vec![
            candidate("a", "", 1.0, 1.0),
            candidate("b", "", 2.0, 1.0),
            candidate("c", "", 2.0, 1.0),
        ];
        assert_eq!(names(&top_candidates(&pool, 2, SelectionOrder::ByScore)), vec!["b", "c"]);
        assert!(top_candidates(&pool, 0, SelectionOrder::ByScore).is_empty());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let deduped = dedup_by_name(vec![
            candidate("잡채", "", 1.0, 5.0),
            candidate("잡채", "", 9.0, 1.0),
            candidate("장조림", "", 1.0, 1.0),
        ]);
        assert_eq!(names(&deduped), vec!["잡채", "장조림"]);
        assert_eq!(deduped[0].score, 1.0);
    }

    #[test]
    fn enforce_keeps_only_the_original_representative() {
        let selector = QuotaSelector::new(vec![soup()], Vec::new());
        let picks = vec![candidate("된장찌개", "국물요리", 6.0, 1.0)];
        let mut result = vec![
            candidate("된장찌개", "국물요리", 6.0, 1.0),
            candidate("장조림", "", 3.0, 1.0),
            candidate("미역국", "국물요리", 4.0, 1.0),
        ];

        selector.enforce(&mut result, &picks);
        assert_eq!(names(&result), vec!["된장찌개", "장조림"]);
    }

    #[test]
    fn enforce_without_pick_keeps_first_member_and_clears_excluded() {
        let selector = QuotaSelector::new(vec![jeon()], vec![soup()]);
        let mut result = vec![
            candidate("미역국", "국물요리", 4.0, 1.0),
            candidate("파전", "", 3.0, 1.0),
            candidate("김치전", "", 5.0, 1.0),
        ];

        selector.enforce(&mut result, &[]);
        assert_eq!(names(&result), vec!["파전"]);
    }
}
