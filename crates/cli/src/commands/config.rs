use std::env;
use std::fs;
use std::path::Path;

use bapsim_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let settings = &config.recommendation;
    let engine = config.recommendation_config();
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "catalog.path",
        &config.catalog.path.display().to_string(),
        source("catalog.path", &["BAPSIM_CATALOG_PATH"]),
    ));
    lines.push(render_line(
        "recommendation.default_count",
        &settings.default_count.to_string(),
        source("recommendation.default_count", &["BAPSIM_RECOMMENDATION_DEFAULT_COUNT"]),
    ));
    lines.push(render_line(
        "recommendation.scoring_mode",
        &format!("{:?}", settings.scoring_mode),
        source("recommendation.scoring_mode", &["BAPSIM_RECOMMENDATION_SCORING_MODE"]),
    ));
    lines.push(render_line(
        "recommendation.ranking_policy",
        &format!("{:?}", settings.ranking_policy),
        source("recommendation.ranking_policy", &["BAPSIM_RECOMMENDATION_RANKING_POLICY"]),
    ));
    lines.push(render_line(
        "recommendation.cold_start",
        &format!("{:?}", settings.cold_start),
        source("recommendation.cold_start", &["BAPSIM_RECOMMENDATION_COLD_START"]),
    ));
    lines.push(render_line(
        "recommendation.fill",
        &format!("{:?}", settings.fill),
        source("recommendation.fill", &["BAPSIM_RECOMMENDATION_FILL"]),
    ));
    lines.push(render_line(
        "recommendation.fill_seed",
        &settings.fill_seed.to_string(),
        source("recommendation.fill_seed", &["BAPSIM_RECOMMENDATION_FILL_SEED"]),
    ));
    lines.push(render_line(
        "recommendation.default_latitude",
        &settings.default_latitude.to_string(),
        source("recommendation.default_latitude", &["BAPSIM_RECOMMENDATION_DEFAULT_LATITUDE"]),
    ));
    lines.push(render_line(
        "recommendation.default_longitude",
        &settings.default_longitude.to_string(),
        source("recommendation.default_longitude", &["BAPSIM_RECOMMENDATION_DEFAULT_LONGITUDE"]),
    ));
    lines.push(render_line(
        "recommendation.soup_tag",
        &settings.soup_tag,
        source("recommendation.soup_tag", &[]),
    ));
    lines.push(render_line(
        "recommendation.vegan_tag",
        &settings.vegan_tag,
        source("recommendation.vegan_tag", &[]),
    ));
    lines.push(render_line(
        "recommendation.reserved_suffixes",
        &settings.reserved_suffixes.join(","),
        source("recommendation.reserved_suffixes", &[]),
    ));
    lines.push(render_line(
        "recommendation.include_distance",
        &settings.include_distance.to_string(),
        source("recommendation.include_distance", &["BAPSIM_RECOMMENDATION_INCLUDE_DISTANCE"]),
    ));

    let weights = [
        ("weights.flavor_contrast", engine.weights.flavor_contrast),
        ("weights.flavor_match", engine.weights.flavor_match),
        ("weights.category_contrast", engine.weights.category_contrast),
        ("weights.ingredient_overlap", engine.weights.ingredient_overlap),
        ("weights.ingredient_novel", engine.weights.ingredient_novel),
        ("weights.cooking_method_repeat", engine.weights.cooking_method_repeat),
        ("weights.cooking_method_novel", engine.weights.cooking_method_novel),
        ("weights.category_repeat", engine.weights.category_repeat),
        ("weights.category_novel", engine.weights.category_novel),
        ("weights.season_match", engine.weights.season_match),
    ];
    for (key, value) in weights {
        let origin = match source(key, &[]).as_str() {
            "default" => format!("{:?} mode default", settings.scoring_mode).to_lowercase(),
            other => other.to_string(),
        };
        lines.push(render_line(key, &value.to_string(), origin));
    }

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["BAPSIM_LOGGING_LEVEL", "BAPSIM_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["BAPSIM_LOGGING_FORMAT", "BAPSIM_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
