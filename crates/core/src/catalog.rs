//! Dish catalog data source and read-only catalog queries
//!
//! The recommendation engine never talks to storage itself. Callers hand it a
//! [`DishCatalog`] handle and the engine fetches a fresh table per request.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::dish::{Dish, DishRecord};
use crate::domain::store::{DishListing, StoreSummary};
use crate::errors::{ApplicationError, CatalogError};

/// Supplies the materialized dish table.
///
/// Implementations must not cache across calls; every fetch reflects the
/// current state of the backing store.
pub trait DishCatalog: Send + Sync {
    fn fetch_dishes(&self) -> Result<Vec<DishRecord>, CatalogError>;
}

/// Catalog held in memory, mostly for tests and embedding.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    records: Vec<DishRecord>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<DishRecord>) -> Self {
        Self { records }
    }
}

impl DishCatalog for InMemoryCatalog {
    fn fetch_dishes(&self) -> Result<Vec<DishRecord>, CatalogError> {
        Ok(self.records.clone())
    }
}

/// Catalog backed by a JSON array of [`DishRecord`] rows, re-read on every fetch.
#[derive(Clone, Debug)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DishCatalog for JsonFileCatalog {
    fn fetch_dishes(&self) -> Result<Vec<DishRecord>, CatalogError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|source| CatalogError::Read { path: self.path.clone(), source })?;
        serde_json::from_str(&raw)
            .map_err(|source| CatalogError::Parse { path: self.path.clone(), source })
    }
}

/// Fetches the table and validates every row.
pub fn load_dishes(catalog: &dyn DishCatalog) -> Result<Vec<Dish>, ApplicationError> {
    let records = catalog.fetch_dishes()?;
    let dishes = records.into_iter().map(Dish::try_from).collect::<Result<Vec<_>, _>>()?;
    Ok(dishes)
}

/// Case-insensitive substring search on dish names. An empty query matches everything.
pub fn search_dishes(dishes: &[Dish], query: &str) -> Vec<DishListing> {
    let needle = query.trim().to_lowercase();
    dishes
        .iter()
        .filter(|dish| needle.is_empty() || dish.name.to_lowercase().contains(&needle))
        .map(|dish| DishListing { cooking_method: None, ..dish.listing() })
        .collect()
}

pub fn dishes_by_store(dishes: &[Dish], store_name: &str) -> Vec<DishListing> {
    let store_name = store_name.trim();
    dishes.iter().filter(|dish| dish.store_name == store_name).map(Dish::listing).collect()
}

/// Distinct stores in catalog order. Coordinates come from the first row seen.
pub fn stores(dishes: &[Dish]) -> Vec<StoreSummary> {
    let mut summaries: Vec<StoreSummary> = Vec::new();
    let mut index_by_name: HashMap<&str, usize> = HashMap::new();

    for dish in dishes {
        if let Some(&index) = index_by_name.get(dish.store_name.as_str()) {
            summaries[index].dish_count += 1;
            continue;
        }
        index_by_name.insert(dish.store_name.as_str(), summaries.len());
        summaries.push(StoreSummary {
            name: dish.store_name.clone(),
            latitude: dish.latitude,
            longitude: dish.longitude,
            dish_count: 1,
        });
    }

    summaries
}
