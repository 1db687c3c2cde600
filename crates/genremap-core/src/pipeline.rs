use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::config::ScrapeConfig;
use crate::error::AppError;
use crate::graph::{GenreGraph, GraphAggregator};
use crate::models::{GenreRecord, GenreStub};
use crate::record::{Extraction, MissingSection, assemble};
use crate::throttle::ThrottledFetcher;
use crate::traits::{Fetcher, RelationExtractor};

/// Events emitted while a run progresses.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    Started {
        total: usize,
        concurrency: usize,
    },
    FetchFailed {
        stub: &'a GenreStub,
        error: &'a AppError,
    },
    SectionMissing {
        stub: &'a GenreStub,
        section: MissingSection,
    },
    GenreProcessed {
        index: usize,
        total: usize,
        stub: &'a GenreStub,
        edges: usize,
    },
    Filtered {
        records: usize,
        removed_edges: usize,
    },
    Cancelled {
        completed: usize,
        total: usize,
    },
}

/// Receives pipeline events (decoupled diagnostics).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPipelineReporter;

impl PipelineReporter for TracingPipelineReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::Started { total, concurrency } => {
                tracing::info!(%total, %concurrency, "Scraping genres");
            }
            PipelineEvent::FetchFailed { stub, error } => {
                tracing::error!(
                    genre_id = %stub.id,
                    name = %stub.name,
                    %error,
                    "Error fetching genre page"
                );
            }
            PipelineEvent::SectionMissing { stub, section } => {
                tracing::warn!(
                    genre_id = %stub.id,
                    name = %stub.name,
                    "Relationships not found: {section}"
                );
            }
            PipelineEvent::GenreProcessed {
                index,
                total,
                stub,
                edges,
            } => {
                tracing::info!(genre_id = %stub.id, %edges, "{index}/{total} processed {}", stub.name);
            }
            PipelineEvent::Filtered {
                records,
                removed_edges,
            } => {
                tracing::info!(%records, %removed_edges, "Removed edges to unknown genres");
            }
            PipelineEvent::Cancelled { completed, total } => {
                tracing::warn!(%completed, %total, "Run cancelled, no output written");
            }
        }
    }
}

/// Orchestrates fetch → extract → assemble per genre, aggregation, and the
/// final integrity filter.
///
/// Generic over the fetcher and extractor so tests run without HTTP.
pub struct ScrapeService<F, X>
where
    F: Fetcher,
    X: RelationExtractor,
{
    fetcher: ThrottledFetcher<F>,
    extractor: X,
    config: ScrapeConfig,
}

impl<F, X> ScrapeService<F, X>
where
    F: Fetcher,
    X: RelationExtractor,
{
    /// Every request goes through a throttle built from `config`.
    pub fn new(fetcher: F, extractor: X, config: ScrapeConfig) -> Self {
        Self {
            fetcher: ThrottledFetcher::new(fetcher, config.throttle()),
            extractor,
            config,
        }
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Build one genre's record. Never fails: a failed fetch or a page
    /// without relationships yields a record with every category empty.
    pub async fn scrape_genre<R: PipelineReporter>(
        &self,
        stub: &GenreStub,
        reporter: &R,
    ) -> GenreRecord {
        let url = self.config.page_url(&stub.id);
        tracing::debug!(genre_id = %stub.id, %url, "Fetching genre page");

        let page = match self.fetcher.fetch(&url).await {
            Ok(html) => Some(html),
            Err(error) => {
                reporter.report(PipelineEvent::FetchFailed {
                    stub,
                    error: &error,
                });
                None
            }
        };

        let extraction = self.extractor.extract(page.as_deref());
        if let Extraction::Missing(section) = &extraction {
            reporter.report(PipelineEvent::SectionMissing {
                stub,
                section: *section,
            });
        }
        assemble(stub, extraction)
    }

    /// Scrape every stub and return the complete, unfiltered graph.
    ///
    /// Up to `concurrency` genres are in flight at once. Records are inserted
    /// whole as they finish, so cancellation leaves each genre either fully
    /// present or absent; a cancelled run returns [`AppError::Cancelled`]
    /// and never yields a partial graph. Repeated stub ids are scraped once.
    pub async fn scrape_all<R: PipelineReporter>(
        &self,
        stubs: &[GenreStub],
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<GenreGraph, AppError> {
        let mut aggregator = GraphAggregator::new(stubs);
        let total = aggregator.expected();
        reporter.report(PipelineEvent::Started {
            total,
            concurrency: self.config.concurrency,
        });

        let mut seen = HashSet::with_capacity(total);
        let unique = stubs.iter().filter(move |stub| {
            let first = seen.insert(stub.id);
            if !first {
                tracing::warn!(genre_id = %stub.id, name = %stub.name, "Duplicate genre stub skipped");
            }
            first
        });

        let mut records = stream::iter(unique)
            .map(|stub| async move { (stub, self.scrape_genre(stub, reporter).await) })
            .buffer_unordered(self.config.concurrency.max(1));

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    let completed = aggregator.completed();
                    reporter.report(PipelineEvent::Cancelled { completed, total });
                    return Err(AppError::Cancelled { completed, total });
                }
                next = records.next() => match next {
                    Some((stub, record)) => {
                        let edges = record.relations.edge_count();
                        aggregator.insert(record);
                        reporter.report(PipelineEvent::GenreProcessed {
                            index: aggregator.completed(),
                            total,
                            stub,
                            edges,
                        });
                    }
                    None => break,
                },
            }
        }

        aggregator.finish()
    }

    /// Full run: scrape every stub, then drop edges to genres outside the
    /// stub set.
    pub async fn run<R: PipelineReporter>(
        &self,
        stubs: &[GenreStub],
        cancel: &CancellationToken,
        reporter: &R,
    ) -> Result<GenreGraph, AppError> {
        let graph = self.scrape_all(stubs, cancel, reporter).await?;
        let records = graph.len();
        let (graph, removed_edges) = graph.remove_dangling_edges();
        reporter.report(PipelineEvent::Filtered {
            records,
            removed_edges,
        });
        Ok(graph)
    }
}
