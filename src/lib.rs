//! Rental listing analyzer.
//!
//! Scrapes a single listing page into a [`models::PropertyRecord`], then
//! enriches it with coordinates, elevation-derived walking slopes and
//! nearby monthly parking found by crawling the parking site's index.

pub mod config;
pub mod costs;
pub mod enrich;
pub mod error;
pub mod geo;
pub mod models;
pub mod scrapers;

pub use error::{ScoutError, ScoutResult};
pub use geo::{classify_slope, haversine_distance};
pub use scrapers::{parse_address, parse_japanese_currency, parse_listing_html};
