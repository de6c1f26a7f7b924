use std::collections::HashSet;
use std::fs;
use std::io;
use std::sync::{Arc, Mutex};

use bapsim_core::recommend::{ColdStartPolicy, Flow, RankingPolicy, ScoringMode};
use bapsim_core::{
    ApplicationError, Coordinates, JsonFileCatalog, RecommendationConfig, RecommendationEngine,
    SelectionRequest,
};
use tempfile::TempDir;

const CATALOG: &str = r#"[
  {"name": "된장찌개", "store_name": "봉천반찬", "latitude": 37.4790, "longitude": 126.9520, "price": 6000,
   "season": "겨울", "category": "찌개", "characteristics": "국물요리", "main_ingredients": "된장,두부", "cooking_method": "끓이기", "flavor": "짠맛"},
  {"name": "미역국", "store_name": "신림반찬", "latitude": 37.4840, "longitude": 126.9290, "price": 5000,
   "season": "사계절", "category": "국", "characteristics": "국물요리,비건", "main_ingredients": "미역", "cooking_method": "끓이기", "flavor": "담백"},
  {"name": "김치전", "store_name": "봉천반찬", "latitude": 37.4790, "longitude": 126.9520, "price": 4000,
   "season": "사계절", "category": "전", "characteristics": "", "main_ingredients": "김치,밀가루", "cooking_method": "부치기", "flavor": "매운맛"},
  {"name": "감자전", "store_name": "신림반찬", "latitude": 37.4840, "longitude": 126.9290, "price": 4500,
   "season": "여름", "category": "전", "characteristics": "비건", "main_ingredients": "감자", "cooking_method": "부치기", "flavor": "담백"},
  {"name": "멸치볶음", "store_name": "봉천반찬", "latitude": 37.4790, "longitude": 126.9520, "price": 3000,
   "season": "사계절", "category": "볶음", "characteristics": "", "main_ingredients": "멸치", "cooking_method": "볶기", "flavor": "짠맛"},
  {"name": "시금치나물", "store_name": "신림반찬", "latitude": 37.4840, "longitude": 126.9290, "price": 2500,
   "season": "봄", "category": "나물", "characteristics": "비건", "main_ingredients": "시금치", "cooking_method": "무치기", "flavor": "담백"},
  {"name": "장조림", "store_name": "서울대입구반찬", "latitude": 37.4812, "longitude": 126.9527, "price": 7000,
   "season": "사계절", "category": "조림", "characteristics": "", "main_ingredients": "소고기,메추리알", "cooking_method": "조리기", "flavor": "짠맛"},
  {"name": "깍두기", "store_name": "서울대입구반찬", "latitude": 37.4812, "longitude": 126.9527, "price": 3500,
   "season": "겨울", "category": "김치", "characteristics": "비건", "main_ingredients": "무", "cooking_method": "절이기", "flavor": "매운맛"},
  {"name": "잡채", "store_name": "봉천반찬", "latitude": 37.4790, "longitude": 126.9520, "price": 5500,
   "season": "사계절", "category": "볶음", "characteristics": "", "main_ingredients": "당면,돼지고기", "cooking_method": "볶기", "flavor": "단맛"},
  {"name": "오이무침", "store_name": "온라인반찬", "price": 2500,
   "season": "여름", "category": "무침", "characteristics": "비건", "main_ingredients": "오이", "cooking_method": "무치기", "flavor": "새콤"}
]"#;

fn write_catalog(dir: &TempDir) -> JsonFileCatalog {
    let path = dir.path().join("dishes.json");
    fs::write(&path, CATALOG).expect("write catalog");
    JsonFileCatalog::new(path)
}

fn names(outcome: &bapsim_core::RecommendationOutcome) -> Vec<String> {
    outcome.recommendations.iter().map(|dish| dish.name.clone()).collect()
}

#[test]
fn personalized_request_honours_every_output_constraint() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = write_catalog(&dir);
    let engine = RecommendationEngine::default();

    let request = SelectionRequest::new().with_held_dishes(["멸치볶음"]).with_count(6);
    let outcome = engine.recommend(&request, &catalog).expect("recommend");

    assert_eq!(outcome.flow, Flow::Personalized);
    assert_eq!(outcome.recommendations.len(), 6);

    let returned = names(&outcome);
    let unique: HashSet<_> = returned.iter().collect();
    assert_eq!(unique.len(), returned.len(), "names must be unique");
    assert!(!returned.contains(&"멸치볶음".to_string()), "held dishes are never recommended");
    assert!(returned.iter().filter(|name| name.ends_with('전')).count() <= 1);
    let soups = returned.iter().filter(|name| *name == "된장찌개" || *name == "미역국").count();
    assert!(soups <= 1, "at most one soup-style dish");
}

#[test]
fn vegan_without_soup_filters_and_under_fills() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = write_catalog(&dir);
    let engine = RecommendationEngine::default();

    let request =
        SelectionRequest::new().with_vegan_only(true).with_include_soup(false).with_count(10);
    let outcome = engine.recommend(&request, &catalog).expect("recommend");

    let returned: HashSet<_> = names(&outcome).into_iter().collect();
    let expected: HashSet<_> =
        ["감자전", "시금치나물", "깍두기", "오이무침"].into_iter().map(String::from).collect();
    assert_eq!(returned, expected);
    assert!(outcome.under_filled);
}

#[test]
fn unknown_coordinates_are_ranked_last_and_omitted() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = write_catalog(&dir);
    let config = RecommendationConfig::default()
        .with_cold_start(ColdStartPolicy::Nearest)
        .with_ranking_policy(RankingPolicy::DistanceFirst);
    let engine = RecommendationEngine::new(config);

    let request = SelectionRequest::new()
        .with_count(10)
        .with_location(Coordinates::new(37.4812, 126.9527));
    let outcome = engine.recommend(&request, &catalog).expect("recommend");

    assert_eq!(outcome.flow, Flow::ColdStart);
    let last = outcome.recommendations.last().expect("non-empty");
    assert_eq!(last.name, "오이무침");
    assert_eq!(last.distance_km, None);

    let first = &outcome.recommendations[0];
    assert_eq!(first.store_name.as_deref(), Some("서울대입구반찬"));
    assert_eq!(first.distance_km, Some(0.0));

    let distances: Vec<f64> =
        outcome.recommendations.iter().filter_map(|dish| dish.distance_km).collect();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn distance_first_ranking_applies_to_personalized_requests() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = write_catalog(&dir);
    let config = RecommendationConfig::default().with_ranking_policy(RankingPolicy::DistanceFirst);
    let engine = RecommendationEngine::new(config);

    let request = SelectionRequest::new()
        .with_held_dishes(["멸치볶음"])
        .with_count(10)
        .with_location(Coordinates::new(37.4812, 126.9527));
    let outcome = engine.recommend(&request, &catalog).expect("recommend");

    assert_eq!(outcome.flow, Flow::Personalized);
    // One soup, one jeon and the five unconstrained dishes.
    assert_eq!(outcome.recommendations.len(), 7);
    assert!(outcome.under_filled);

    let first = &outcome.recommendations[0];
    assert_eq!(first.store_name.as_deref(), Some("서울대입구반찬"));
    assert_eq!(first.distance_km, Some(0.0));
    assert_eq!(outcome.recommendations.last().map(|dish| dish.name.as_str()), Some("오이무침"));

    let distances: Vec<f64> =
        outcome.recommendations.iter().filter_map(|dish| dish.distance_km).collect();
    assert_eq!(distances.len(), 6);
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn rich_mode_prefers_novel_ingredients_and_methods() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = write_catalog(&dir);
    let config = RecommendationConfig::default().with_scoring_mode(ScoringMode::Rich);
    let engine = RecommendationEngine::new(config);

    let request = SelectionRequest::new()
        .with_held_dishes(["잡채"])
        .with_count(2)
        .with_include_soup(false)
        .with_season("봄");
    let outcome = engine.recommend(&request, &catalog).expect("recommend");

    // The only spring dish is new on every axis and outranks the jeon representative.
    assert_eq!(names(&outcome), vec!["시금치나물".to_string(), "김치전".to_string()]);
}

#[test]
fn concurrent_requests_share_one_engine() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = write_catalog(&dir);
    let engine = RecommendationEngine::default();
    let request = SelectionRequest::new().with_held_dishes(["장조림"]).with_count(4);
    let baseline = names(&engine.recommend(&request, &catalog).expect("baseline"));

    let results: Vec<Vec<String>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| names(&engine.recommend(&request, &catalog).expect("recommend"))))
            .collect();
        handles.into_iter().map(|handle| handle.join().expect("thread")).collect()
    });

    assert!(results.iter().all(|result| *result == baseline));
}

#[test]
fn missing_catalog_surfaces_catalog_error() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = JsonFileCatalog::new(dir.path().join("absent.json"));
    let engine = RecommendationEngine::default();

    let error = engine.recommend(&SelectionRequest::new(), &catalog).expect_err("missing file");
    assert!(matches!(error, ApplicationError::Catalog(_)));
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn engine_logs_through_the_installed_subscriber() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = write_catalog(&dir);
    let engine = RecommendationEngine::default();
    let buffer = SharedBuffer::default();
    let writer = buffer.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let outcome = tracing::subscriber::with_default(subscriber, || {
        let request =
            SelectionRequest::new().with_count(-1).with_vegan_only(true).with_include_soup(false);
        engine.recommend(&request, &catalog).expect("recommend")
    });

    let logs = String::from_utf8(buffer.0.lock().expect("buffer lock").clone()).expect("utf8");
    assert!(logs.contains("recommendation.request.invalid_count"));
    assert!(logs.contains("recommendation.cold_start"));
    assert!(logs.contains("recommendation.under_filled"));
    assert!(logs.contains(&outcome.correlation_id));
    assert!(outcome.recommendations.iter().all(|dish| dish.name != "미역국"));
}
