use serde::{Deserialize, Serialize};

/// Search parameters for the monthly-parking crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingQuery {
    /// Postal address of the property
    pub address: String,
    /// Property latitude
    pub lat: f64,
    /// Property longitude
    pub lng: f64,
    /// Search radius in kilometres
    pub radius_km: f64,
}

impl ParkingQuery {
    pub fn new(address: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            address: address.into(),
            lat,
            lng,
            ..Self::default()
        }
    }

    pub fn with_radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = radius_km;
        self
    }
}

impl Default for ParkingQuery {
    fn default() -> Self {
        Self {
            address: String::new(),
            lat: 0.0,
            lng: 0.0,
            radius_km: 1.0,
        }
    }
}
