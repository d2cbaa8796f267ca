use crate::error::ScoutResult;
use async_trait::async_trait;

/// Plain HTTP GET returning the response body
///
/// Lets the crawler run against canned pages in tests and against
/// `reqwest` in production.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`; a non-success status is a transport error
    async fn fetch(&self, url: &str) -> ScoutResult<String>;
}
