//! Id-indexed genre graph, its aggregator, and the integrity filter.

use std::collections::{HashMap, HashSet};

use crate::error::AppError;
use crate::models::{GenreId, GenreRecord, GenreStub};

/// The complete set of genre records, indexed by id.
///
/// Iteration follows the order in which genres were requested, which is
/// also the output order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenreGraph {
    order: Vec<GenreId>,
    records: HashMap<GenreId, GenreRecord>,
}

impl GenreGraph {
    /// Build a graph from already assembled records. Later duplicates of an
    /// id are dropped.
    pub fn from_records(records: impl IntoIterator<Item = GenreRecord>) -> Self {
        let mut graph = Self::default();
        for record in records {
            if graph.records.contains_key(&record.id) {
                tracing::warn!(genre_id = %record.id, "Duplicate genre record skipped");
                continue;
            }
            graph.order.push(record.id);
            graph.records.insert(record.id, record);
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &GenreId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &GenreId) -> Option<&GenreRecord> {
        self.records.get(id)
    }

    /// Records in request order.
    pub fn records(&self) -> impl Iterator<Item = &GenreRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Number of edges whose target is not a record of this graph.
    pub fn dangling_edge_count(&self) -> usize {
        self.records()
            .flat_map(|record| record.relations.iter())
            .flat_map(|(_, edges)| edges)
            .filter(|edge| !self.contains(&edge.id))
            .count()
    }

    /// Drop every edge whose target id is not a record of this graph.
    ///
    /// Survivors keep their relative order, nothing is added, and applying
    /// this to its own output removes nothing. Must only be called on a
    /// complete graph. Returns the filtered graph and the number of edges
    /// removed.
    pub fn remove_dangling_edges(mut self) -> (Self, usize) {
        let known: HashSet<GenreId> = self.order.iter().copied().collect();
        let removed: usize = self
            .records
            .values_mut()
            .map(|record| record.relations.retain(|edge| known.contains(&edge.id)))
            .sum();
        (self, removed)
    }
}

/// Accumulates records for a known stub set until every stub is present.
///
/// The aggregator is the only owner of the id → record map while a run is in
/// progress; producers hand it finished records and never hold a reference
/// into it.
#[derive(Debug)]
pub struct GraphAggregator {
    graph: GenreGraph,
    expected: HashSet<GenreId>,
}

impl GraphAggregator {
    pub fn new(stubs: &[GenreStub]) -> Self {
        let mut order = Vec::with_capacity(stubs.len());
        let mut expected = HashSet::with_capacity(stubs.len());
        for stub in stubs {
            if expected.insert(stub.id) {
                order.push(stub.id);
            }
        }
        Self {
            graph: GenreGraph {
                order,
                records: HashMap::with_capacity(expected.len()),
            },
            expected,
        }
    }

    /// Add a finished record. Returns false, leaving the graph untouched, if
    /// the id was not requested or already has a record.
    pub fn insert(&mut self, record: GenreRecord) -> bool {
        if !self.expected.contains(&record.id) {
            tracing::warn!(genre_id = %record.id, "Record for unrequested genre ignored");
            return false;
        }
        if self.graph.records.contains_key(&record.id) {
            tracing::warn!(genre_id = %record.id, "Duplicate record ignored");
            return false;
        }
        self.graph.records.insert(record.id, record);
        true
    }

    pub fn completed(&self) -> usize {
        self.graph.records.len()
    }

    pub fn expected(&self) -> usize {
        self.expected.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed() == self.expected()
    }

    /// Release the graph once every stub has a record.
    pub fn finish(self) -> Result<GenreGraph, AppError> {
        if !self.is_complete() {
            return Err(AppError::IncompleteGraph {
                missing: self.expected() - self.completed(),
                expected: self.expected(),
            });
        }
        Ok(self.graph)
    }
}
