use anyhow::Context;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_LISTING_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const DEFAULT_CRAWLER_USER_AGENT: &str = "BukkenAnalyzer/1.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub listing_user_agent: String,
    pub crawler_user_agent: String,
    pub parking_base_url: String,
    pub gsi_search_url: String,
    pub gsi_elevation_url: String,
    pub nominatim_url: String,
    pub http_timeout: Duration,
    pub parking_radius_km: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_user_agent: DEFAULT_LISTING_USER_AGENT.to_string(),
            crawler_user_agent: DEFAULT_CRAWLER_USER_AGENT.to_string(),
            parking_base_url: "https://at-parking.jp".to_string(),
            gsi_search_url: "https://msearch.gsi.go.jp/address-search/AddressSearch".to_string(),
            gsi_elevation_url:
                "https://cyberjapandata2.gsi.go.jp/general/dem/scripts/getelevation.php".to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
            http_timeout: Duration::from_secs(30),
            parking_radius_km: 1.0,
        }
    }
}

impl Config {
    /// Load from the environment (and `.env` if present), falling back to
    /// the defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        let http_timeout = Duration::from_secs(parse_var(
            "BUKKEN_HTTP_TIMEOUT_SECS",
            env::var("BUKKEN_HTTP_TIMEOUT_SECS").ok(),
            defaults.http_timeout.as_secs(),
        )?);
        let parking_radius_km = parse_var(
            "BUKKEN_PARKING_RADIUS_KM",
            env::var("BUKKEN_PARKING_RADIUS_KM").ok(),
            defaults.parking_radius_km,
        )?;

        Ok(Self {
            listing_user_agent: var_or("BUKKEN_LISTING_USER_AGENT", defaults.listing_user_agent),
            crawler_user_agent: var_or("BUKKEN_CRAWLER_USER_AGENT", defaults.crawler_user_agent),
            parking_base_url: var_or("BUKKEN_PARKING_BASE_URL", defaults.parking_base_url),
            gsi_search_url: var_or("BUKKEN_GSI_SEARCH_URL", defaults.gsi_search_url),
            gsi_elevation_url: var_or("BUKKEN_GSI_ELEVATION_URL", defaults.gsi_elevation_url),
            nominatim_url: var_or("BUKKEN_NOMINATIM_URL", defaults.nominatim_url),
            http_timeout,
            parking_radius_km,
        })
    }
}

/// Numeric setting: unset keeps the default, garbage is an error
fn parse_var<T>(key: &str, raw: Option<String>, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{key} is not a number: {v}")),
        None => Ok(default),
    }
}

fn var_or(key: &str, default: String) -> String {
    env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_services() {
        let config = Config::default();
        assert_eq!(config.crawler_user_agent, "BukkenAnalyzer/1.0");
        assert_eq!(config.parking_base_url, "https://at-parking.jp");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.parking_radius_km, 1.0);
    }

    #[test]
    fn unset_variable_keeps_default() {
        assert_eq!(
            var_or("BUKKEN_TEST_SURELY_UNSET_VARIABLE", "fallback".to_string()),
            "fallback"
        );
    }

    #[test]
    fn numeric_settings_reject_garbage() {
        let err = parse_var("BUKKEN_HTTP_TIMEOUT_SECS", Some("abc".to_string()), 30u64).unwrap_err();
        assert!(err.to_string().contains("BUKKEN_HTTP_TIMEOUT_SECS"));
        assert!(parse_var("BUKKEN_PARKING_RADIUS_KM", Some("1km".to_string()), 1.0f64).is_err());
    }

    #[test]
    fn numeric_settings_parse_or_default() {
        assert_eq!(parse_var("BUKKEN_HTTP_TIMEOUT_SECS", None, 30u64).unwrap(), 30);
        assert_eq!(parse_var("BUKKEN_HTTP_TIMEOUT_SECS", Some(" 5 ".to_string()), 30u64).unwrap(), 5);
        assert_eq!(
            parse_var("BUKKEN_PARKING_RADIUS_KM", Some("2.5".to_string()), 1.0f64).unwrap(),
            2.5
        );
    }
}
