//! Geocoding, elevation and parking enrichment of a scraped listing.
//!
//! Units of work (one station, one elevation sample) run concurrently and
//! fail independently: a failed unit is dropped or zeroed, never the batch.

pub mod elevation;
pub mod geocoding;

pub use elevation::{ElevationLookup, GsiElevation};
pub use geocoding::{GeocodeLookup, GsiGeocoder};

use crate::config::Config;
use crate::costs::calculate_initial_costs;
use crate::geo::{classify_slope, interpolate_profile, slope_gradient, DEFAULT_PROFILE_STEPS};
use crate::models::{
    AnalysisReport, Coordinates, ElevationPoint, ElevationProfile, ProfilePoint, PropertyRecord,
    StationAccess, StationElevation,
};
use crate::scrapers::{HttpFetcher, ParkingCrawler, ParkingQuery};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

const PROPERTY_LABEL: &str = "物件";

pub struct Enricher {
    geocoder: Arc<dyn GeocodeLookup>,
    elevation: Arc<dyn ElevationLookup>,
    parking: ParkingCrawler,
    parking_radius_km: f64,
    profile_steps: usize,
}

impl Enricher {
    pub fn new(
        geocoder: Arc<dyn GeocodeLookup>,
        elevation: Arc<dyn ElevationLookup>,
        parking: ParkingCrawler,
        parking_radius_km: f64,
    ) -> Self {
        Self {
            geocoder,
            elevation,
            parking,
            parking_radius_km,
            profile_steps: DEFAULT_PROFILE_STEPS,
        }
    }

    /// Production wiring: GSI/Nominatim lookups and the live parking site
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let fetcher = HttpFetcher::new(&config.crawler_user_agent, config.http_timeout)?;
        let client = fetcher.client().clone();

        Ok(Self::new(
            Arc::new(GsiGeocoder::new(client.clone(), config)),
            Arc::new(GsiElevation::new(client, config.gsi_elevation_url.clone())),
            ParkingCrawler::new(Arc::new(fetcher), config.parking_base_url.clone()),
            config.parking_radius_km,
        ))
    }

    pub async fn analyze(&self, property: PropertyRecord) -> AnalysisReport {
        let costs = calculate_initial_costs(&property);
        let mut report = AnalysisReport {
            property: PropertyRecord::default(),
            costs,
            coordinates: None,
            property_elevation: None,
            stations: Vec::new(),
            profiles: Vec::new(),
            parking_lots: Vec::new(),
            scraped_at: Utc::now(),
        };

        if property.address.is_empty() {
            info!(url = %property.source_url, "No address, skipping geo enrichment");
            report.property = property;
            return report;
        }

        let Some(origin) = self.geocoder.geocode_address(&property.address).await else {
            warn!(address = %property.address, "Property could not be geocoded");
            report.property = property;
            return report;
        };
        report.coordinates = Some(origin);

        let station_coords = join_all(
            property
                .stations
                .iter()
                .map(|s| self.geocoder.geocode_station(&s.station, Some(origin))),
        )
        .await;
        let located: Vec<(&StationAccess, Coordinates)> = property
            .stations
            .iter()
            .zip(station_coords)
            .filter_map(|(access, coords)| coords.map(|c| (access, c)))
            .collect();
        info!(
            stations = property.stations.len(),
            located = located.len(),
            "Stations geocoded"
        );

        let mut points = vec![(PROPERTY_LABEL.to_string(), origin)];
        points.extend(
            located
                .iter()
                .map(|(access, coords)| (format!("{}駅", access.station), *coords)),
        );
        let elevations = self.elevations(points).await;
        let property_elevation = elevations[0].clone();

        report.stations = located
            .iter()
            .zip(&elevations[1..])
            .map(|((access, coords), sample)| {
                let diff = property_elevation.elevation - sample.elevation;
                StationElevation {
                    access: (*access).clone(),
                    lat: coords.lat,
                    lng: coords.lng,
                    elevation: sample.elevation,
                    property_elevation: property_elevation.elevation,
                    elevation_diff: diff,
                    slope_category: classify_slope(diff),
                    slope_label: classify_slope(diff).label().to_string(),
                    slope_gradient: slope_gradient(diff, access.walk_minutes),
                }
            })
            .collect();
        report.property_elevation = Some(property_elevation);

        report.profiles = join_all(
            located
                .iter()
                .map(|(access, coords)| self.profile(&access.station, *coords, origin)),
        )
        .await;

        let query = ParkingQuery::new(property.address.clone(), origin.lat, origin.lng)
            .with_radius_km(self.parking_radius_km);
        report.parking_lots = self.parking.search_parking_near(&query).await;

        report.property = property;
        report
    }

    /// Elevation for each labelled point, 0 where the lookup failed
    async fn elevations(&self, points: Vec<(String, Coordinates)>) -> Vec<ElevationPoint> {
        let samples = join_all(points.iter().map(|(_, c)| self.elevation.elevation(*c))).await;
        points
            .into_iter()
            .zip(samples)
            .map(|((label, c), elevation)| ElevationPoint {
                label,
                elevation: elevation.unwrap_or_default(),
                lat: c.lat,
                lng: c.lng,
            })
            .collect()
    }

    async fn profile(&self, station: &str, from: Coordinates, to: Coordinates) -> ElevationProfile {
        let samples = self
            .elevations(interpolate_profile(from, to, station, self.profile_steps))
            .await;
        ElevationProfile {
            station_name: station.to_string(),
            points: samples
                .into_iter()
                .map(|s| ProfilePoint {
                    label: s.label,
                    elevation: s.elevation,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ScoutError, ScoutResult};
    use crate::models::SlopeCategory;
    use crate::scrapers::PageFetcher;
    use async_trait::async_trait;

    const PROPERTY: Coordinates = Coordinates { lat: 35.58, lng: 139.58 };
    const STATION: Coordinates = Coordinates { lat: 35.59, lng: 139.57 };

    struct StubGeocoder;

    #[async_trait]
    impl GeocodeLookup for StubGeocoder {
        async fn geocode_address(&self, _address: &str) -> Option<Coordinates> {
            Some(PROPERTY)
        }

        async fn geocode_station(&self, station: &str, _near: Option<Coordinates>) -> Option<Coordinates> {
            (station == "宮崎台").then_some(STATION)
        }
    }

    /// Property sits 12 m above the station; midpoints have no data
    struct StubElevation;

    #[async_trait]
    impl ElevationLookup for StubElevation {
        async fn elevation(&self, point: Coordinates) -> Option<f64> {
            if point == PROPERTY {
                Some(42.0)
            } else if point == STATION {
                Some(30.0)
            } else {
                None
            }
        }
    }

    struct Offline;

    #[async_trait]
    impl PageFetcher for Offline {
        async fn fetch(&self, url: &str) -> ScoutResult<String> {
            Err(ScoutError::Transport(format!("offline: {url}")))
        }
    }

    fn enricher() -> Enricher {
        Enricher::new(
            Arc::new(StubGeocoder),
            Arc::new(StubElevation),
            ParkingCrawler::new(Arc::new(Offline), "https://parking.test"),
            1.0,
        )
    }

    fn access(station: &str, walk_minutes: u32) -> StationAccess {
        StationAccess {
            line: "東急田園都市線".to_string(),
            station: station.to_string(),
            walk_minutes,
        }
    }

    #[tokio::test]
    async fn failed_station_does_not_sink_the_batch() {
        let property = PropertyRecord {
            name: "メゾン馬絹".to_string(),
            rent: 85_000,
            address: "神奈川県川崎市宮前区馬絹６丁目".to_string(),
            stations: vec![access("宮崎台", 9), access("存在しない", 3)],
            ..Default::default()
        };
        let report = enricher().analyze(property).await;

        assert_eq!(report.coordinates, Some(PROPERTY));
        assert_eq!(report.property_elevation.as_ref().map(|p| p.elevation), Some(42.0));
        assert_eq!(report.stations.len(), 1);

        let st = &report.stations[0];
        assert_eq!(st.access.station, "宮崎台");
        assert_eq!(st.elevation_diff, 12.0);
        assert_eq!(st.slope_category, SlopeCategory::Gentle);
        assert_eq!(st.slope_label, "ゆるやかな坂");
        assert!((st.slope_gradient - 12.0 / 720.0 * 100.0).abs() < 1e-9);

        assert_eq!(report.profiles.len(), 1);
        let profile = &report.profiles[0];
        assert_eq!(profile.points.len(), DEFAULT_PROFILE_STEPS + 1);
        assert_eq!(profile.points[0].label, "宮崎台駅");
        assert_eq!(profile.points[0].elevation, 30.0);
        assert_eq!(profile.points[5].elevation, 0.0);

        assert!(report.parking_lots.is_empty());
        assert_eq!(report.property.name, "メゾン馬絹");
    }

    #[tokio::test]
    async fn no_address_skips_geo() {
        let report = enricher()
            .analyze(PropertyRecord {
                rent: 50_000,
                ..Default::default()
            })
            .await;
        assert!(report.coordinates.is_none());
        assert!(report.stations.is_empty());
        assert_eq!(report.costs.items[0].amount, 50_000);
    }
}
