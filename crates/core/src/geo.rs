//! Great-circle distance between user and store coordinates

use serde::{Deserialize, Serialize};

/// Mean earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Distance to a possibly-unknown point. See [`haversine_km`].
    pub fn distance_to(&self, latitude: Option<f64>, longitude: Option<f64>) -> f64 {
        haversine_km(Some(self.latitude), Some(self.longitude), latitude, longitude)
    }
}

/// Haversine distance in kilometers.
///
/// Any missing or non-finite input yields `f64::INFINITY`, which sorts after
/// every real distance. The function never panics and has no side effects.
pub fn haversine_km(
    lat1: Option<f64>,
    lon1: Option<f64>,
    lat2: Option<f64>,
    lon2: Option<f64>,
) -> f64 {
    let (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) = (lat1, lon1, lat2, lon2) else {
        return f64::INFINITY;
    };
    if ![lat1, lon1, lat2, lon2].iter().all(|value| value.is_finite()) {
        return f64::INFINITY;
    }

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1.0 for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let distance = EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    if distance.is_finite() {
        distance
    } else {
        f64::INFINITY
    }
}
