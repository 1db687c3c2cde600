//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::models::GenreId;
use crate::pipeline::{PipelineEvent, PipelineReporter};
use crate::record::Extraction;
use crate::traits::{Fetcher, RelationExtractor};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns configurable responses.
///
/// Responses registered for a URL are served first (once each); otherwise
/// the queue is popped; otherwise a default HTML string is returned.
#[derive(Clone)]
pub struct MockFetcher {
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pages: Arc<Mutex<HashMap<String, Result<String, AppError>>>>,
    requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    fn build(
        responses: Vec<Result<String, AppError>>,
        pages: Vec<(String, Result<String, AppError>)>,
    ) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            pages: Arc::new(Mutex::new(pages.into_iter().collect())),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn new(html: &str) -> Self {
        Self::build(vec![Ok(html.to_string())], Vec::new())
    }

    pub fn with_error(error: AppError) -> Self {
        Self::build(vec![Err(error)], Vec::new())
    }

    /// Responses keyed by URL, independent of request order.
    pub fn with_pages(pages: Vec<(String, Result<String, AppError>)>) -> Self {
        Self::build(Vec::new(), pages)
    }

    /// URLs fetched so far, in call order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        if let Some(response) = self.pages.lock().unwrap().remove(url) {
            return response;
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that maps exact page bodies to canned extractions.
///
/// `None` pages yield [`Extraction::NoContent`]; unknown pages yield an
/// extraction with no rows.
#[derive(Clone, Default)]
pub struct MockExtractor {
    pages: Arc<HashMap<String, Extraction>>,
}

impl MockExtractor {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_pages(pages: Vec<(&str, Extraction)>) -> Self {
        Self {
            pages: Arc::new(
                pages
                    .into_iter()
                    .map(|(page, extraction)| (page.to_string(), extraction))
                    .collect(),
            ),
        }
    }
}

impl RelationExtractor for MockExtractor {
    fn extract(&self, page: Option<&str>) -> Extraction {
        match page {
            None => Extraction::NoContent,
            Some(html) => self
                .pages
                .get(html)
                .cloned()
                .unwrap_or_else(|| Extraction::Found(BTreeMap::new())),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Owned summary of a [`PipelineEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedEvent {
    Started { total: usize },
    FetchFailed(GenreId),
    SectionMissing(GenreId),
    Processed { index: usize, total: usize },
    Filtered { records: usize, removed_edges: usize },
    Cancelled { completed: usize, total: usize },
}

/// Reporter that records every event it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl PipelineReporter for RecordingReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        let recorded = match event {
            PipelineEvent::Started { total, .. } => RecordedEvent::Started { total },
            PipelineEvent::FetchFailed { stub, .. } => RecordedEvent::FetchFailed(stub.id),
            PipelineEvent::SectionMissing { stub, .. } => RecordedEvent::SectionMissing(stub.id),
            PipelineEvent::GenreProcessed { index, total, .. } => {
                RecordedEvent::Processed { index, total }
            }
            PipelineEvent::Filtered {
                records,
                removed_edges,
            } => RecordedEvent::Filtered {
                records,
                removed_edges,
            },
            PipelineEvent::Cancelled { completed, total } => {
                RecordedEvent::Cancelled { completed, total }
            }
        };
        self.events.lock().unwrap().push(recorded);
    }
}
