use std::path::PathBuf;

use bapsim_core::{
    Coordinates, InterfaceError, JsonFileCatalog, RecommendationEngine, SelectionRequest,
};
use clap::Args;
use tracing::info;
use uuid::Uuid;

use super::{load_config, CommandResult, EXIT_CATALOG_UNAVAILABLE, EXIT_ENGINE_FAILURE};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Default, Args)]
pub struct RecommendArgs {
    #[arg(long = "held", value_name = "DISH", help = "Dish the user already has (repeatable)")]
    pub held: Vec<String>,
    #[arg(long, allow_negative_numbers = true, help = "Number of dishes to recommend")]
    pub count: Option<i64>,
    #[arg(long, help = "Never recommend soup-style dishes")]
    pub no_soup: bool,
    #[arg(long, help = "Season to favour, e.g. 봄 or 겨울")]
    pub season: Option<String>,
    #[arg(long, help = "Only recommend vegan dishes")]
    pub vegan: bool,
    #[arg(long, requires = "lon", allow_negative_numbers = true, help = "User latitude")]
    pub lat: Option<f64>,
    #[arg(long, requires = "lat", allow_negative_numbers = true, help = "User longitude")]
    pub lon: Option<f64>,
    #[arg(long, value_name = "PATH", help = "Dish catalog JSON file")]
    pub catalog: Option<PathBuf>,
}

impl RecommendArgs {
    fn to_request(&self) -> SelectionRequest {
        let mut request = SelectionRequest::new()
            .with_held_dishes(self.held.iter().cloned())
            .with_include_soup(!self.no_soup)
            .with_vegan_only(self.vegan);
        request.count = self.count;
        request.season = self.season.clone();
        if let (Some(latitude), Some(longitude)) = (self.lat, self.lon) {
            request = request.with_location(Coordinates::new(latitude, longitude));
        }
        request
    }
}

pub fn run(args: RecommendArgs) -> CommandResult {
    let config = match load_config(COMMAND, args.catalog.clone()) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let engine = RecommendationEngine::new(config.recommendation_config());
    let catalog = JsonFileCatalog::new(&config.catalog.path);
    let correlation_id = Uuid::new_v4().to_string();
    let request = args.to_request().with_correlation_id(correlation_id.as_str());

    match engine.recommend(&request, &catalog) {
        Ok(outcome) => {
            info!(
                event_name = "cli.recommend.completed",
                correlation_id = %outcome.correlation_id,
                returned = outcome.recommendations.len(),
                "recommendation command completed"
            );
            let message = if outcome.under_filled {
                format!(
                    "{} of {} requested dishes recommended",
                    outcome.recommendations.len(),
                    outcome.requested
                )
            } else {
                format!("{} dishes recommended", outcome.recommendations.len())
            };
            CommandResult::success_with_data(COMMAND, message, &outcome)
        }
        Err(error) => {
            let detail = error.to_string();
            let interface = error.into_interface(correlation_id.as_str());
            let (error_class, exit_code) = match interface {
                InterfaceError::ServiceUnavailable { .. } => {
                    ("catalog_unavailable", EXIT_CATALOG_UNAVAILABLE)
                }
                InterfaceError::Internal { .. } => ("engine_failure", EXIT_ENGINE_FAILURE),
            };
            CommandResult::traced_failure(
                COMMAND,
                error_class,
                format!("{} ({detail})", interface.user_message()),
                exit_code,
                interface.correlation_id(),
            )
        }
    }
}
