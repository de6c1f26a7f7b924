pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use bapsim_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};

use commands::recommend::RecommendArgs;

#[derive(Debug, Parser)]
#[command(
    name = "bapsim",
    about = "Bapsim side-dish recommender CLI",
    long_about = "Recommend side dishes from a dish catalog, query stores and dishes, and inspect configuration.",
    after_help = "Examples:\n  bapsim recommend --held 멸치볶음 --count 5\n  bapsim search 김치\n  bapsim doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Recommend side dishes that complement the dishes already held")]
    Recommend(RecommendArgs),
    #[command(about = "Search dishes by name (case-insensitive substring)")]
    Search {
        query: String,
        #[arg(long, value_name = "PATH", help = "Dish catalog JSON file")]
        catalog: Option<PathBuf>,
    },
    #[command(about = "List the dishes sold by one store")]
    StoreDishes {
        store: String,
        #[arg(long, value_name = "PATH", help = "Dish catalog JSON file")]
        catalog: Option<PathBuf>,
    },
    #[command(about = "List distinct stores with their coordinates")]
    Stores {
        #[arg(long, value_name = "PATH", help = "Dish catalog JSON file")]
        catalog: Option<PathBuf>,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Validate config, catalog readability, and catalog row validity")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    if let Ok(config) = AppConfig::load(LoadOptions::default()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Recommend(args) => commands::recommend::run(args),
        Command::Search { query, catalog } => commands::catalog::search(&query, catalog),
        Command::StoreDishes { store, catalog } => commands::catalog::store_dishes(&store, catalog),
        Command::Stores { catalog } => commands::catalog::list_stores(catalog),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Installs the global subscriber. Events go to stderr so stdout stays JSON.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder =
        tracing_subscriber::fmt().with_target(false).with_max_level(log_level).with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    if let Err(error) = installed {
        eprintln!("logging was already initialized: {error}");
    }
}
