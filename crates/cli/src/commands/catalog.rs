use std::path::{Path, PathBuf};

use anyhow::Context;
use bapsim_core::{dishes_by_store, load_dishes, search_dishes, stores, Dish, JsonFileCatalog};

use super::{load_config, CommandResult, EXIT_CATALOG_UNAVAILABLE};

pub fn search(query: &str, catalog_path: Option<PathBuf>) -> CommandResult {
    let dishes = match fetch("search", catalog_path) {
        Ok(dishes) => dishes,
        Err(failure) => return failure,
    };
    let hits = search_dishes(&dishes, query);
    CommandResult::success_with_data("search", format!("{} dishes matched", hits.len()), &hits)
}

pub fn store_dishes(store_name: &str, catalog_path: Option<PathBuf>) -> CommandResult {
    let dishes = match fetch("store-dishes", catalog_path) {
        Ok(dishes) => dishes,
        Err(failure) => return failure,
    };
    let listing = dishes_by_store(&dishes, store_name);
    CommandResult::success_with_data(
        "store-dishes",
        format!("{} dishes sold by {}", listing.len(), store_name.trim()),
        &listing,
    )
}

pub fn list_stores(catalog_path: Option<PathBuf>) -> CommandResult {
    let dishes = match fetch("stores", catalog_path) {
        Ok(dishes) => dishes,
        Err(failure) => return failure,
    };
    let summaries = stores(&dishes);
    CommandResult::success_with_data("stores", format!("{} stores", summaries.len()), &summaries)
}

fn fetch(command: &str, catalog_path: Option<PathBuf>) -> Result<Vec<Dish>, CommandResult> {
    let config = load_config(command, catalog_path)?;
    read_catalog(&config.catalog.path).map_err(|error| {
        CommandResult::failure(
            command,
            "catalog_unavailable",
            format!("{error:#}"),
            EXIT_CATALOG_UNAVAILABLE,
        )
    })
}

fn read_catalog(path: &Path) -> anyhow::Result<Vec<Dish>> {
    let catalog = JsonFileCatalog::new(path);
    load_dishes(&catalog).with_context(|| format!("loading dish catalog `{}`", path.display()))
}
