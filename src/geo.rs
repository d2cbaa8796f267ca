//! Great-circle distance and slope classification.

use crate::models::{Coordinates, SlopeCategory};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Elevation difference (m) up to which a walk counts as flat
pub const SLOPE_FLAT_MAX_M: f64 = 5.0;
/// Elevation difference (m) up to which a walk counts as a gentle slope
pub const SLOPE_GENTLE_MAX_M: f64 = 15.0;

/// Walking speed the listing site uses for "徒歩N分"
pub const WALK_METERS_PER_MINUTE: f64 = 80.0;

pub const DEFAULT_PROFILE_STEPS: usize = 10;

/// Haversine distance between two points, in kilometres
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

pub fn distance_meters(from: Coordinates, to: Coordinates) -> u32 {
    (haversine_distance(from.lat, from.lng, to.lat, to.lng) * 1000.0).round() as u32
}

/// Classify by absolute elevation difference; direction does not matter
pub fn classify_slope(elevation_diff_m: f64) -> SlopeCategory {
    let abs_diff = elevation_diff_m.abs();
    if abs_diff <= SLOPE_FLAT_MAX_M {
        SlopeCategory::Flat
    } else if abs_diff <= SLOPE_GENTLE_MAX_M {
        SlopeCategory::Gentle
    } else {
        SlopeCategory::Steep
    }
}

pub fn walk_distance_m(walk_minutes: u32) -> f64 {
    f64::from(walk_minutes) * WALK_METERS_PER_MINUTE
}

/// Percent grade of the walk, 0 when the walking distance is unknown
pub fn slope_gradient(elevation_diff_m: f64, walk_minutes: u32) -> f64 {
    let distance = walk_distance_m(walk_minutes);
    if distance > 0.0 {
        elevation_diff_m.abs() / distance * 100.0
    } else {
        0.0
    }
}

/// Evenly spaced points on the straight line from a station to the
/// property, labelled "{name}駅", "{pct}%", …, "物件".
pub fn interpolate_profile(
    station: Coordinates,
    property: Coordinates,
    station_name: &str,
    steps: usize,
) -> Vec<(String, Coordinates)> {
    let steps = steps.max(1);
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let point = Coordinates {
                lat: station.lat + (property.lat - station.lat) * t,
                lng: station.lng + (property.lng - station.lng) * t,
            };
            let label = if i == 0 {
                format!("{station_name}駅")
            } else if i == steps {
                "物件".to_string()
            } else {
                format!("{}%", (t * 100.0).round() as u32)
            };
            (label, point)
        })
        .collect()
}
