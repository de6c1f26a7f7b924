use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinates;
use crate::recommend::{
    ColdStartPolicy, FillRule, Projection, RankingPolicy, RecommendationConfig, ScoringMode,
    WeightTable, DEFAULT_COUNT, DEFAULT_FILL_SEED, DEFAULT_LOCATION, JEON_SUFFIX, SOUP_TAG,
    VEGAN_TAG,
};

/// Config file names checked when no explicit path is given, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 2] = ["bapsim.toml", "config/bapsim.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub recommendation: RecommendationSettings,
    pub weights: WeightOverrides,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct RecommendationSettings {
    pub default_count: usize,
    pub scoring_mode: ScoringMode,
    pub ranking_policy: RankingPolicy,
    pub cold_start: ColdStartPolicy,
    pub fill: FillRule,
    pub fill_seed: u64,
    pub default_latitude: f64,
    pub default_longitude: f64,
    pub soup_tag: String,
    pub vegan_tag: String,
    pub reserved_suffixes: Vec<String>,
    pub include_distance: bool,
}

/// Per-weight overrides on top of the active scoring mode's table.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct WeightOverrides {
    pub flavor_contrast: Option<f64>,
    pub flavor_match: Option<f64>,
    pub category_contrast: Option<f64>,
    pub ingredient_overlap: Option<f64>,
    pub ingredient_novel: Option<f64>,
    pub cooking_method_repeat: Option<f64>,
    pub cooking_method_novel: Option<f64>,
    pub category_repeat: Option<f64>,
    pub category_novel: Option<f64>,
    pub season_match: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub default_count: Option<usize>,
    pub scoring_mode: Option<ScoringMode>,
    pub ranking_policy: Option<RankingPolicy>,
    pub cold_start: Option<ColdStartPolicy>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig { path: PathBuf::from("demos/dishes.json") },
            recommendation: RecommendationSettings {
                default_count: DEFAULT_COUNT,
                scoring_mode: ScoringMode::Simple,
                ranking_policy: RankingPolicy::ScoreFirst,
                cold_start: ColdStartPolicy::Score,
                fill: FillRule::Seeded,
                fill_seed: DEFAULT_FILL_SEED,
                default_latitude: DEFAULT_LOCATION.latitude,
                default_longitude: DEFAULT_LOCATION.longitude,
                soup_tag: SOUP_TAG.to_string(),
                vegan_tag: VEGAN_TAG.to_string(),
                reserved_suffixes: vec![JEON_SUFFIX.to_string()],
                include_distance: true,
            },
            weights: WeightOverrides::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl std::str::FromStr for ScoringMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "rich" => Ok(Self::Rich),
            other => Err(ConfigError::Validation(format!(
                "unsupported scoring mode `{other}` (expected simple|rich)"
            ))),
        }
    }
}

impl std::str::FromStr for RankingPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "score_first" => Ok(Self::ScoreFirst),
            "distance_first" => Ok(Self::DistanceFirst),
            other => Err(ConfigError::Validation(format!(
                "unsupported ranking policy `{other}` (expected score_first|distance_first)"
            ))),
        }
    }
}

impl std::str::FromStr for ColdStartPolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "score" => Ok(Self::Score),
            "nearest" => Ok(Self::Nearest),
            other => Err(ConfigError::Validation(format!(
                "unsupported cold start policy `{other}` (expected score|nearest)"
            ))),
        }
    }
}

impl std::str::FromStr for FillRule {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "seeded" => Ok(Self::Seeded),
            "pool_order" => Ok(Self::PoolOrder),
            other => Err(ConfigError::Validation(format!(
                "unsupported fill rule `{other}` (expected seeded|pool_order)"
            ))),
        }
    }
}

impl WeightOverrides {
    /// Overlays the configured values on `base`.
    pub fn apply_to(&self, base: WeightTable) -> WeightTable {
        WeightTable {
            flavor_contrast: self.flavor_contrast.unwrap_or(base.flavor_contrast),
            flavor_match: self.flavor_match.unwrap_or(base.flavor_match),
            category_contrast: self.category_contrast.unwrap_or(base.category_contrast),
            ingredient_overlap: self.ingredient_overlap.unwrap_or(base.ingredient_overlap),
            ingredient_novel: self.ingredient_novel.unwrap_or(base.ingredient_novel),
            cooking_method_repeat: self.cooking_method_repeat.unwrap_or(base.cooking_method_repeat),
            cooking_method_novel: self.cooking_method_novel.unwrap_or(base.cooking_method_novel),
            category_repeat: self.category_repeat.unwrap_or(base.category_repeat),
            category_novel: self.category_novel.unwrap_or(base.category_novel),
            season_match: self.season_match.unwrap_or(base.season_match),
        }
    }

    fn entries(&self) -> [(&'static str, Option<f64>); 10] {
        [
            ("flavor_contrast", self.flavor_contrast),
            ("flavor_match", self.flavor_match),
            ("category_contrast", self.category_contrast),
            ("ingredient_overlap", self.ingredient_overlap),
            ("ingredient_novel", self.ingredient_novel),
            ("cooking_method_repeat", self.cooking_method_repeat),
            ("cooking_method_novel", self.cooking_method_novel),
            ("category_repeat", self.category_repeat),
            ("category_novel", self.category_novel),
            ("season_match", self.season_match),
        ]
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    /// Engine configuration derived from the loaded settings.
    pub fn recommendation_config(&self) -> RecommendationConfig {
        let settings = &self.recommendation;
        RecommendationConfig {
            scoring_mode: settings.scoring_mode,
            weights: self.weights.apply_to(settings.scoring_mode.default_weights()),
            ranking_policy: settings.ranking_policy,
            cold_start: settings.cold_start,
            fill_rule: settings.fill,
            fill_seed: settings.fill_seed,
            default_count: settings.default_count,
            default_location: Coordinates::new(
                settings.default_latitude,
                settings.default_longitude,
            ),
            soup_tag: settings.soup_tag.clone(),
            vegan_tag: settings.vegan_tag.clone(),
            reserved_suffixes: settings.reserved_suffixes.clone(),
            projection: Projection { distance: settings.include_distance, ..Projection::default() },
        }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
        }

        if let Some(recommendation) = patch.recommendation {
            let settings = &mut self.recommendation;
            if let Some(default_count) = recommendation.default_count {
                settings.default_count = default_count;
            }
            if let Some(scoring_mode) = recommendation.scoring_mode {
                settings.scoring_mode = scoring_mode;
            }
            if let Some(ranking_policy) = recommendation.ranking_policy {
                settings.ranking_policy = ranking_policy;
            }
            if let Some(cold_start) = recommendation.cold_start {
                settings.cold_start = cold_start;
            }
            if let Some(fill) = recommendation.fill {
                settings.fill = fill;
            }
            if let Some(fill_seed) = recommendation.fill_seed {
                settings.fill_seed = fill_seed;
            }
            if let Some(default_latitude) = recommendation.default_latitude {
                settings.default_latitude = default_latitude;
            }
            if let Some(default_longitude) = recommendation.default_longitude {
                settings.default_longitude = default_longitude;
            }
            if let Some(soup_tag) = recommendation.soup_tag {
                settings.soup_tag = soup_tag;
            }
            if let Some(vegan_tag) = recommendation.vegan_tag {
                settings.vegan_tag = vegan_tag;
            }
            if let Some(reserved_suffixes) = recommendation.reserved_suffixes {
                settings.reserved_suffixes = reserved_suffixes;
            }
            if let Some(include_distance) = recommendation.include_distance {
                settings.include_distance = include_distance;
            }
        }

        if let Some(weights) = patch.weights {
            self.weights = weights;
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BAPSIM_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }

        let settings = &mut self.recommendation;
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_DEFAULT_COUNT") {
            settings.default_count = parse_usize("BAPSIM_RECOMMENDATION_DEFAULT_COUNT", &value)?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_SCORING_MODE") {
            settings.scoring_mode = value.parse()?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_RANKING_POLICY") {
            settings.ranking_policy = value.parse()?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_COLD_START") {
            settings.cold_start = value.parse()?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_FILL") {
            settings.fill = value.parse()?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_FILL_SEED") {
            settings.fill_seed = parse_u64("BAPSIM_RECOMMENDATION_FILL_SEED", &value)?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_DEFAULT_LATITUDE") {
            settings.default_latitude = parse_f64("BAPSIM_RECOMMENDATION_DEFAULT_LATITUDE", &value)?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_DEFAULT_LONGITUDE") {
            settings.default_longitude =
                parse_f64("BAPSIM_RECOMMENDATION_DEFAULT_LONGITUDE", &value)?;
        }
        if let Some(value) = read_env("BAPSIM_RECOMMENDATION_INCLUDE_DISTANCE") {
            settings.include_distance =
                parse_bool("BAPSIM_RECOMMENDATION_INCLUDE_DISTANCE", &value)?;
        }

        let log_level = read_env("BAPSIM_LOGGING_LEVEL").or_else(|| read_env("BAPSIM_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BAPSIM_LOGGING_FORMAT").or_else(|| read_env("BAPSIM_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(default_count) = overrides.default_count {
            self.recommendation.default_count = default_count;
        }
        if let Some(scoring_mode) = overrides.scoring_mode {
            self.recommendation.scoring_mode = scoring_mode;
        }
        if let Some(ranking_policy) = overrides.ranking_policy {
            self.recommendation.ranking_policy = ranking_policy;
        }
        if let Some(cold_start) = overrides.cold_start {
            self.recommendation.cold_start = cold_start;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_recommendation(&self.recommendation)?;
        validate_weights(&self.weights)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `load` would read, if any.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    DEFAULT_CONFIG_PATHS.into_iter().map(PathBuf::from).find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.path must point to a JSON dish catalog".to_string(),
        ));
    }
    Ok(())
}

fn validate_recommendation(settings: &RecommendationSettings) -> Result<(), ConfigError> {
    if settings.default_count == 0 {
        return Err(ConfigError::Validation(
            "recommendation.default_count must be greater than zero".to_string(),
        ));
    }

    if !settings.default_latitude.is_finite() || settings.default_latitude.abs() > 90.0 {
        return Err(ConfigError::Validation(
            "recommendation.default_latitude must be in range -90..=90".to_string(),
        ));
    }
    if !settings.default_longitude.is_finite() || settings.default_longitude.abs() > 180.0 {
        return Err(ConfigError::Validation(
            "recommendation.default_longitude must be in range -180..=180".to_string(),
        ));
    }

    if settings.soup_tag.trim().is_empty() {
        return Err(ConfigError::Validation(
            "recommendation.soup_tag must not be empty".to_string(),
        ));
    }
    if settings.vegan_tag.trim().is_empty() {
        return Err(ConfigError::Validation(
            "recommendation.vegan_tag must not be empty".to_string(),
        ));
    }
    if settings.reserved_suffixes.iter().any(|suffix| suffix.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "recommendation.reserved_suffixes must not contain empty entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_weights(weights: &WeightOverrides) -> Result<(), ConfigError> {
    for (name, value) in weights.entries() {
        if let Some(value) = value {
            if !value.is_finite() {
                return Err(ConfigError::Validation(format!(
                    "weights.{name} must be a finite number"
                )));
            }
        }
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    recommendation: Option<RecommendationPatch>,
    weights: Option<WeightOverrides>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    default_count: Option<usize>,
    scoring_mode: Option<ScoringMode>,
    ranking_policy: Option<RankingPolicy>,
    cold_start: Option<ColdStartPolicy>,
    fill: Option<FillRule>,
    fill_seed: Option<u64>,
    default_latitude: Option<f64>,
    default_longitude: Option<f64>,
    soup_tag: Option<String>,
    vegan_tag: Option<String>,
    reserved_suffixes: Option<Vec<String>>,
    include_distance: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
