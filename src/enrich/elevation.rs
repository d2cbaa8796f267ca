use crate::error::{ScoutError, ScoutResult};
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

/// Value the GSI service returns where it has no data (e.g. over the sea)
const NO_DATA: &str = "-----";

#[async_trait]
pub trait ElevationLookup: Send + Sync {
    /// Elevation in metres, `None` when unavailable
    async fn elevation(&self, point: Coordinates) -> Option<f64>;
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ElevationValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ElevationResponse {
    elevation: Option<ElevationValue>,
}

pub fn parse_elevation(body: &str) -> ScoutResult<f64> {
    let response: ElevationResponse =
        serde_json::from_str(body).map_err(|e| ScoutError::Unparseable(e.to_string()))?;
    match response.elevation {
        Some(ElevationValue::Number(n)) => Ok(n),
        Some(ElevationValue::Text(t)) if t == NO_DATA => Err(ScoutError::NotFound("no elevation data".to_string())),
        Some(ElevationValue::Text(t)) => t
            .trim()
            .parse::<f64>()
            .map_err(|_| ScoutError::Unparseable(format!("elevation {t}"))),
        None => Err(ScoutError::NotFound("no elevation field".to_string())),
    }
}

/// GSI digital elevation model lookup
pub struct GsiElevation {
    client: Client,
    url: String,
}

impl GsiElevation {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn lookup(&self, point: Coordinates) -> ScoutResult<f64> {
        let response = self
            .client
            .get(&self.url)
            .query(&[
                ("lon", point.lng.to_string()),
                ("lat", point.lat.to_string()),
                ("outtype", "JSON".to_string()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ScoutError::Transport(format!("elevation returned {}", response.status())));
        }
        parse_elevation(&response.text().await?)
    }
}

#[async_trait]
impl ElevationLookup for GsiElevation {
    async fn elevation(&self, point: Coordinates) -> Option<f64> {
        match self.lookup(point).await {
            Ok(elevation) => Some(elevation),
            Err(e) => {
                warn!(lat = point.lat, lng = point.lng, error = %e, "Elevation lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_string_elevations() {
        assert_eq!(parse_elevation(r#"{"elevation":42.7,"hsrc":"5m（レーザ）"}"#).unwrap(), 42.7);
        assert_eq!(parse_elevation(r#"{"elevation":"38.1","hsrc":"10m"}"#).unwrap(), 38.1);
    }

    #[test]
    fn no_data_sentinel() {
        assert!(matches!(
            parse_elevation(r#"{"elevation":"-----","hsrc":"-----"}"#),
            Err(ScoutError::NotFound(_))
        ));
        assert!(matches!(parse_elevation("{}"), Err(ScoutError::NotFound(_))));
    }
}
