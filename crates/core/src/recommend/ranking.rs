//! Final ordering and output projection

use super::types::*;

/// Sorts the selected dishes in place. Stable, so equal keys keep selection order.
pub fn rank(result: &mut [ScoredCandidate], policy: RankingPolicy) {
    match policy {
        RankingPolicy::ScoreFirst => result.sort_by(|a, b| {
            b.score.total_cmp(&a.score).then_with(|| a.distance_km.total_cmp(&b.distance_km))
        }),
        RankingPolicy::DistanceFirst => {
            result.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
        }
    }
}

/// Public view of the ranked dishes. Scores never leave the engine and
/// unknown distances are reported as absent.
pub fn project(result: &[ScoredCandidate], projection: &Projection) -> Vec<Recommendation> {
    result
        .iter()
        .map(|candidate| {
            let dish = &candidate.dish;
            Recommendation {
                name: dish.name.clone(),
                store_name: projection.store_name.then(|| dish.store_name.clone()),
                price: projection.price.then_some(dish.price),
                image_url: if projection.image_url { dish.image_url.clone() } else { None },
                distance_km: (projection.distance && candidate.distance_km.is_finite())
                    .then_some(candidate.distance_km),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dish::{Dish, DishRecord};

    fn candidate(name: &str, score: f64, distance_km: f64) -> ScoredCandidate {
        let dish = Dish::try_from(DishRecord {
            name: name.to_owned(),
            store_name: "봉천반찬".to_owned(),
            price: 4500,
            image_url: Some(format!("https://img.example/{name}.jpg")),
            ..DishRecord::default()
        })
        .expect("valid dish");
        ScoredCandidate { score, ..ScoredCandidate::new(dish, distance_km) }
    }

    fn names(candidates: &[ScoredCandidate]) -> Vec<&str> {
        candidates.iter().map(ScoredCandidate::name).collect()
    }

    #[test]
    fn score_first_breaks_ties_by_distance() {
        let mut result = vec![
            candidate("far", 5.0, 3.0),
            candidate("low", 1.0, 0.1),
            candidate("near", 5.0, 0.5),
            candidate("unknown", 5.0, f64::INFINITY),
        ];
        rank(&mut result, RankingPolicy::ScoreFirst);
        assert_eq!(names(&result), vec!["near", "far", "unknown", "low"]);
    }

    #[test]
    fn distance_first_ignores_score_and_puts_unknown_last() {
        let mut result = vec![
            candidate("unknown", 9.0, f64::INFINITY),
            candidate("far", 9.0, 3.0),
            candidate("near", 1.0, 0.5),
        ];
        rank(&mut result, RankingPolicy::DistanceFirst);
        assert_eq!(names(&result), vec!["near", "far", "unknown"]);
    }

    #[test]
    fn projection_hides_disabled_fields_and_infinite_distance() {
        let result = vec![candidate("잡채", 2.0, 1.25), candidate("장조림", 1.0, f64::INFINITY)];
        let projection = Projection { image_url: false, ..Projection::default() };

        let output = project(&result, &projection);

        assert_eq!(output[0].store_name.as_deref(), Some("봉천반찬"));
        assert_eq!(output[0].price, Some(4500));
        assert_eq!(output[0].image_url, None);
        assert_eq!(output[0].distance_km, Some(1.25));
        assert_eq!(output[1].distance_km, None);
    }

    #[test]
    fn projected_json_never_exposes_score() {
        let output = project(&[candidate("잡채", 7.0, 1.0)], &Projection::default());
        let json = serde_json::to_value(&output).expect("serialize");
        assert!(json[0].get("score").is_none());
        assert_eq!(json[0]["name"], "잡채");
    }
}
