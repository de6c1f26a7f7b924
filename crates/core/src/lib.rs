pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod geo;
pub mod recommend;

pub use catalog::{
    dishes_by_store, load_dishes, search_dishes, stores, DishCatalog, InMemoryCatalog,
    JsonFileCatalog,
};
pub use domain::dish::{Dish, DishRecord};
pub use domain::store::{DishListing, StoreSummary};
pub use errors::{ApplicationError, CatalogError, DomainError, InterfaceError};
pub use geo::{haversine_km, Coordinates};
pub use recommend::{
    Recommendation, RecommendationConfig, RecommendationEngine, RecommendationOutcome,
    SelectionRequest,
};
