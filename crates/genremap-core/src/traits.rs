use std::future::Future;

use crate::error::AppError;
use crate::record::Extraction;

/// Fetches raw HTML content from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Parses a genre page into per-category relation edges.
///
/// `None` is the "no content" sentinel for a page whose fetch failed.
pub trait RelationExtractor: Send + Sync + Clone {
    fn extract(&self, page: Option<&str>) -> Extraction;
}
