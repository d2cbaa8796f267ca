use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Nearest-station access line as printed on the listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StationAccess {
    pub line: String,
    pub station: String,
    pub walk_minutes: u32,
}

/// Core property data model
///
/// Every field falls back to its zero value when the listing does not
/// expose it; `0` and `""` mean "not found".
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub name: String,
    /// Monthly rent (yen)
    pub rent: i64,
    pub management_fee: i64,
    pub deposit: i64,
    pub key_money: i64,
    /// e.g. "1LDK"
    pub layout: String,
    /// Floor area (m²)
    pub area: f64,
    /// e.g. "3階/5階建"
    pub floor: String,
    pub building_type: String,
    pub age: String,
    pub address: String,
    pub stations: Vec<StationAccess>,
    pub features: Vec<String>,
    pub direction: String,
    pub contract_type: String,
    pub images: Vec<String>,
    #[serde(rename = "url")]
    pub source_url: String,
}

impl PropertyRecord {
    /// True when neither rent nor name could be recovered, which callers
    /// treat as a failed scrape.
    pub fn is_empty(&self) -> bool {
        self.rent == 0 && self.name.is_empty()
    }
}

/// Postal address split into the three levels the parking site indexes by
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AddressComponents {
    pub prefecture: String,
    pub city_ward: String,
    pub town: String,
}

/// Monthly parking lot near a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingLot {
    pub id: String,
    pub name: String,
    pub address: String,
    /// Display string, kept verbatim from the source site
    pub price: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "url")]
    pub detail_url: String,
    #[serde(rename = "distanceM")]
    pub distance_meters: u32,
    pub is_24h: bool,
    pub is_indoor: bool,
    pub is_outdoor: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlopeCategory {
    Flat,
    Gentle,
    Steep,
}

impl SlopeCategory {
    pub fn label(self) -> &'static str {
        match self {
            SlopeCategory::Flat => "平坦",
            SlopeCategory::Gentle => "ゆるやかな坂",
            SlopeCategory::Steep => "急な坂",
        }
    }
}

/// Elevation sample at a labelled point
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElevationPoint {
    pub label: String,
    pub elevation: f64,
    pub lat: f64,
    pub lng: f64,
}

/// Station access enriched with its elevation relative to the property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StationElevation {
    #[serde(flatten)]
    pub access: StationAccess,
    pub lat: f64,
    pub lng: f64,
    pub elevation: f64,
    pub property_elevation: f64,
    /// Property minus station; positive means uphill from the station
    pub elevation_diff: f64,
    pub slope_category: SlopeCategory,
    /// Display text for `slope_category`
    pub slope_label: String,
    /// Percent grade over the estimated walking distance
    pub slope_gradient: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePoint {
    pub label: String,
    pub elevation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ElevationProfile {
    pub station_name: String,
    pub points: Vec<ProfilePoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitialCostItem {
    pub label: String,
    pub amount: i64,
    pub is_estimate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitialCostBreakdown {
    pub items: Vec<InitialCostItem>,
    pub total: i64,
    pub estimated_total: i64,
}

/// Everything the analyzer knows about one listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub property: PropertyRecord,
    pub costs: InitialCostBreakdown,
    pub coordinates: Option<Coordinates>,
    pub property_elevation: Option<ElevationPoint>,
    pub stations: Vec<StationElevation>,
    pub profiles: Vec<ElevationProfile>,
    pub parking_lots: Vec<ParkingLot>,
    pub scraped_at: DateTime<Utc>,
}
