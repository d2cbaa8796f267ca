use crate::config::Config;
use crate::error::{ScoutError, ScoutResult};
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Half-width of the search box around the property, about 5 km
const STATION_VIEWBOX_DELTA: f64 = 0.05;

/// Address and station geocoding
#[async_trait]
pub trait GeocodeLookup: Send + Sync {
    async fn geocode_address(&self, address: &str) -> Option<Coordinates>;

    /// Geocode "{station}駅", preferring hits near `near` when given
    async fn geocode_station(&self, station: &str, near: Option<Coordinates>) -> Option<Coordinates>;
}

#[derive(Debug, Deserialize)]
struct GsiFeature {
    geometry: Option<GsiGeometry>,
}

#[derive(Debug, Deserialize)]
struct GsiGeometry {
    /// GeoJSON order: longitude, latitude
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// First hit of a GSI address search response
pub fn parse_gsi_search(body: &str) -> ScoutResult<Coordinates> {
    let features: Vec<GsiFeature> =
        serde_json::from_str(body).map_err(|e| ScoutError::Unparseable(e.to_string()))?;
    let coordinates = features
        .into_iter()
        .next()
        .and_then(|f| f.geometry)
        .map(|g| g.coordinates)
        .ok_or_else(|| ScoutError::NotFound("no GSI search result".to_string()))?;

    match coordinates.as_slice() {
        [lng, lat, ..] => Ok(Coordinates { lat: *lat, lng: *lng }),
        _ => Err(ScoutError::Unparseable("GSI coordinates".to_string())),
    }
}

/// First hit of a Nominatim search response
pub fn parse_nominatim(body: &str) -> ScoutResult<Coordinates> {
    let places: Vec<NominatimPlace> =
        serde_json::from_str(body).map_err(|e| ScoutError::Unparseable(e.to_string()))?;
    let place = places
        .into_iter()
        .next()
        .ok_or_else(|| ScoutError::NotFound("no Nominatim result".to_string()))?;

    let lat = place.lat.parse::<f64>().map_err(|_| ScoutError::Unparseable(place.lat.clone()))?;
    let lng = place.lon.parse::<f64>().map_err(|_| ScoutError::Unparseable(place.lon.clone()))?;
    Ok(Coordinates { lat, lng })
}

/// GSI address search with an OpenStreetMap Nominatim fallback
pub struct GsiGeocoder {
    client: Client,
    gsi_search_url: String,
    nominatim_url: String,
}

impl GsiGeocoder {
    pub fn new(client: Client, config: &Config) -> Self {
        Self {
            client,
            gsi_search_url: config.gsi_search_url.clone(),
            nominatim_url: config.nominatim_url.clone(),
        }
    }

    async fn get_text(&self, url: &str, query: &[(&str, String)]) -> ScoutResult<String> {
        let response = self.client.get(url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(ScoutError::Transport(format!("{url} returned {}", response.status())));
        }
        Ok(response.text().await?)
    }

    async fn gsi(&self, address: &str) -> ScoutResult<Coordinates> {
        let body = self
            .get_text(&self.gsi_search_url, &[("q", address.to_string())])
            .await?;
        parse_gsi_search(&body)
    }

    async fn nominatim(&self, query: &str, near: Option<Coordinates>) -> ScoutResult<Coordinates> {
        let mut params = vec![
            ("format", "json".to_string()),
            ("q", query.to_string()),
            ("countrycodes", "jp".to_string()),
            ("limit", "1".to_string()),
        ];
        if let Some(near) = near {
            let d = STATION_VIEWBOX_DELTA;
            params.push((
                "viewbox",
                format!("{},{},{},{}", near.lng - d, near.lat + d, near.lng + d, near.lat - d),
            ));
            params.push(("bounded", "1".to_string()));
        }
        let body = self.get_text(&self.nominatim_url, &params).await?;
        parse_nominatim(&body)
    }
}

#[async_trait]
impl GeocodeLookup for GsiGeocoder {
    async fn geocode_address(&self, address: &str) -> Option<Coordinates> {
        match self.gsi(address).await {
            Ok(coords) => return Some(coords),
            Err(e) => warn!(address, error = %e, "GSI geocoding failed"),
        }

        match self.nominatim(address, None).await {
            Ok(coords) => Some(coords),
            Err(e) => {
                warn!(address, error = %e, "Nominatim geocoding failed");
                None
            }
        }
    }

    async fn geocode_station(&self, station: &str, near: Option<Coordinates>) -> Option<Coordinates> {
        let query = format!("{station}駅");

        if near.is_some() {
            match self.nominatim(&query, near).await {
                Ok(coords) => {
                    debug!(station, lat = coords.lat, lng = coords.lng, "Station geocoded near property");
                    return Some(coords);
                }
                Err(e) => debug!(station, error = %e, "Bounded station search missed"),
            }
        }

        debug!(station, "Falling back to general search");
        self.geocode_address(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gsi_coordinates_are_lng_lat() {
        let body = r#"[{"geometry":{"coordinates":[139.5886,35.5865],"type":"Point"},
                       "type":"Feature","properties":{"title":"神奈川県川崎市宮前区馬絹"}}]"#;
        let coords = parse_gsi_search(body).unwrap();
        assert_eq!(coords, Coordinates { lat: 35.5865, lng: 139.5886 });
    }

    #[test]
    fn gsi_empty_result_is_not_found() {
        assert!(matches!(parse_gsi_search("[]"), Err(ScoutError::NotFound(_))));
        assert!(matches!(parse_gsi_search("<html>"), Err(ScoutError::Unparseable(_))));
    }

    #[test]
    fn nominatim_string_coordinates() {
        let body = r#"[{"place_id":1,"lat":"35.5866","lon":"139.5772","display_name":"宮崎台"}]"#;
        assert_eq!(
            parse_nominatim(body).unwrap(),
            Coordinates { lat: 35.5866, lng: 139.5772 }
        );
        assert!(matches!(parse_nominatim("[]"), Err(ScoutError::NotFound(_))));
    }
}
