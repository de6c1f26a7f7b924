use serde::{Deserialize, Serialize};

/// Public view of a dish row used by search and store listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishListing {
    pub name: String,
    pub store_name: String,
    pub price: u64,
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooking_method: Option<String>,
}

/// A store that sells at least one catalog dish.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreSummary {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub dish_count: usize,
}
