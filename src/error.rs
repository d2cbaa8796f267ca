/// Internal failure taxonomy for crawl stages and lookups.
///
/// None of these escape `parse_listing_html` or `search_parking_near`;
/// they are logged and collapsed into the empty result there.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    /// An expected link, field or pattern is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// A matched fragment did not convert to the expected shape.
    #[error("unparseable: {0}")]
    Unparseable(String),

    /// The fetch failed or returned a non-success status.
    #[error("transport: {0}")]
    Transport(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type ScoutResult<T> = Result<T, ScoutError>;
