pub mod address;
pub mod fields;
pub mod http;
pub mod images;
pub mod listing;
pub mod numbers;
pub mod parking;
pub mod stations;
pub mod table;
pub mod traits;
pub mod types;

pub use address::parse_address;
pub use http::{is_listing_url, HttpFetcher};
pub use listing::{debug_listing_html, parse_listing_html, ListingDebug};
pub use numbers::parse_japanese_currency;
pub use parking::ParkingCrawler;
pub use traits::PageFetcher;
pub use types::ParkingQuery;
