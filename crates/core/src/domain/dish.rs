use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

use super::store::DishListing;

/// Separator used by the catalog for multi-valued columns.
pub const LIST_DELIMITER: char = ',';

/// One row of the dish table exactly as the data store delivers it.
///
/// A dish sold by several stores appears once per store, so `name` is not
/// unique across rows.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DishRecord {
    pub name: String,
    #[serde(default)]
    pub store_name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default)]
    pub price: i64,
    pub image_url: Option<String>,
    pub season: Option<String>,
    pub category: Option<String>,
    pub characteristics: Option<String>,
    pub main_ingredients: Option<String>,
    pub cooking_method: Option<String>,
    pub flavor: Option<String>,
}

/// A validated candidate dish with its multi-valued columns parsed into sets.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dish {
    pub name: String,
    pub store_name: String,
    pub category: Option<String>,
    pub flavor: Option<String>,
    pub season: Option<String>,
    pub main_ingredients: BTreeSet<String>,
    pub cooking_method: Option<String>,
    pub characteristics: BTreeSet<String>,
    pub price: u64,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Dish {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.characteristics.contains(tag)
    }

    pub fn has_suffix(&self, suffix: &str) -> bool {
        self.name.ends_with(suffix)
    }

    pub fn shares_ingredient_with(&self, ingredients: &BTreeSet<String>) -> bool {
        !self.main_ingredients.is_disjoint(ingredients)
    }

    pub fn listing(&self) -> DishListing {
        DishListing {
            name: self.name.clone(),
            store_name: self.store_name.clone(),
            price: self.price,
            image_url: self.image_url.clone(),
            cooking_method: self.cooking_method.clone(),
        }
    }
}

impl TryFrom<DishRecord> for Dish {
    type Error = DomainError;

    fn try_from(record: DishRecord) -> Result<Self, Self::Error> {
        let name = record.name.trim().to_owned();
        if name.is_empty() {
            return Err(DomainError::MalformedDish {
                name: record.name,
                reason: "dish name is empty".to_owned(),
            });
        }

        let price = u64::try_from(record.price).map_err(|_| DomainError::MalformedDish {
            name: name.clone(),
            reason: format!("price {} is negative", record.price),
        })?;

        for (label, value) in [("latitude", record.latitude), ("longitude", record.longitude)] {
            if value.is_some_and(|value| !value.is_finite()) {
                return Err(DomainError::MalformedDish {
                    name,
                    reason: format!("{label} is not a finite number"),
                });
            }
        }

        Ok(Self {
            name,
            store_name: record.store_name.trim().to_owned(),
            category: non_blank(record.category),
            flavor: non_blank(record.flavor),
            season: non_blank(record.season),
            main_ingredients: split_delimited(record.main_ingredients.as_deref()),
            cooking_method: non_blank(record.cooking_method),
            characteristics: split_delimited(record.characteristics.as_deref()),
            price,
            image_url: non_blank(record.image_url),
            latitude: record.latitude,
            longitude: record.longitude,
        })
    }
}

/// Splits a delimited column into a set of trimmed, non-empty values.
pub fn split_delimited(raw: Option<&str>) -> BTreeSet<String> {
    raw.map(|raw| {
        raw.split(LIST_DELIMITER)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> DishRecord {
        DishRecord {
            name: name.to_owned(),
            store_name: "반찬가게".to_owned(),
            price: 3000,
            ..DishRecord::default()
        }
    }

    #[test]
    fn delimited_columns_become_trimmed_sets() {
        let parsed = split_delimited(Some(" 두부, 애호박 ,,두부"));
        let expected: BTreeSet<String> = ["두부", "애호박"].into_iter().map(String::from).collect();
        assert_eq!(parsed, expected);
        assert!(split_delimited(None).is_empty());
    }

    #[test]
    fn record_converts_with_tags_and_blank_fields_dropped() {
        let dish = Dish::try_from(DishRecord {
            characteristics: Some("비건, 국물요리".to_owned()),
            season: Some("  ".to_owned()),
            flavor: Some("짠맛".to_owned()),
            ..record("된장찌개")
        })
        .expect("valid record");

        assert!(dish.has_tag("비건"));
        assert!(dish.has_tag("국물요리"));
        assert!(!dish.has_tag("매운맛"));
        assert_eq!(dish.season, None);
        assert_eq!(dish.flavor.as_deref(), Some("짠맛"));
        assert_eq!(dish.price, 3000);
    }

    #[test]
    fn negative_price_is_malformed() {
        let error = Dish::try_from(DishRecord { price: -1, ..record("멸치볶음") })
            .expect_err("negative price should be rejected");
        assert!(matches!(error, DomainError::MalformedDish { ref name, .. } if name == "멸치볶음"));
    }

    #[test]
    fn empty_name_is_malformed() {
        assert!(Dish::try_from(record("   ")).is_err());
    }

    #[test]
    fn non_finite_coordinate_is_malformed() {
        let error = Dish::try_from(DishRecord { latitude: Some(f64::NAN), ..record("잡채") })
            .expect_err("NaN latitude should be rejected");
        assert!(error.to_string().contains("latitude"));
    }

    #[test]
    fn suffix_and_ingredient_checks() {
        let dish = Dish::try_from(DishRecord {
            main_ingredients: Some("김치,밀가루".to_owned()),
            ..record("김치전")
        })
        .expect("valid record");

        assert!(dish.has_suffix("전"));
        let held: BTreeSet<String> = ["김치".to_owned()].into_iter().collect();
        assert!(dish.shares_ingredient_with(&held));
        assert!(!dish.shares_ingredient_with(&BTreeSet::new()));
    }
}
