//! Reading stub documents and reading/writing relation documents.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::graph::GenreGraph;
use crate::models::{GenreId, GenreRecord, GenreStub, RelationCategory, RelationEdge, Relations};

/// `{ "genres": [ ... ] }`
#[derive(Debug, Deserialize)]
struct StubDocument {
    genres: Vec<GenreStub>,
}

/// Wire form of a [`GenreRecord`]. Missing relation fields read as empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDocument {
    pub id: GenreId,
    pub name: String,
    #[serde(rename = "artistCount", default)]
    pub artist_count: u64,
    #[serde(default)]
    pub subgenre_of: Vec<RelationEdge>,
    #[serde(default)]
    pub subgenres: Vec<RelationEdge>,
    #[serde(default)]
    pub fusion_genres: Vec<RelationEdge>,
    #[serde(default)]
    pub fusion_of: Vec<RelationEdge>,
    #[serde(default)]
    pub influenced_by: Vec<RelationEdge>,
    #[serde(default)]
    pub influenced_genres: Vec<RelationEdge>,
}

impl From<&GenreRecord> for RecordDocument {
    fn from(record: &GenreRecord) -> Self {
        let edges = |category| record.relations.get(category).to_vec();
        Self {
            id: record.id,
            name: record.name.clone(),
            artist_count: record.artist_count,
            subgenre_of: edges(RelationCategory::SubgenreOf),
            subgenres: edges(RelationCategory::Subgenres),
            fusion_genres: edges(RelationCategory::FusionGenres),
            fusion_of: edges(RelationCategory::FusionOf),
            influenced_by: edges(RelationCategory::InfluencedBy),
            influenced_genres: edges(RelationCategory::InfluencedGenres),
        }
    }
}

impl From<RecordDocument> for GenreRecord {
    fn from(doc: RecordDocument) -> Self {
        let relations = Relations::default()
            .with(RelationCategory::SubgenreOf, doc.subgenre_of)
            .with(RelationCategory::Subgenres, doc.subgenres)
            .with(RelationCategory::FusionGenres, doc.fusion_genres)
            .with(RelationCategory::FusionOf, doc.fusion_of)
            .with(RelationCategory::InfluencedBy, doc.influenced_by)
            .with(RelationCategory::InfluencedGenres, doc.influenced_genres);
        Self {
            id: doc.id,
            name: doc.name,
            artist_count: doc.artist_count,
            relations,
        }
    }
}

/// Parse a stub document. Any malformed entry rejects the whole document.
pub fn parse_stubs(json: &str) -> Result<Vec<GenreStub>, AppError> {
    let doc: StubDocument = serde_json::from_str(json)?;
    Ok(doc.genres)
}

pub fn load_stubs(path: &Path) -> Result<Vec<GenreStub>, AppError> {
    let json = fs::read_to_string(path)?;
    parse_stubs(&json)
}

/// Parse a relation document into a graph, keeping document order.
pub fn parse_records(json: &str) -> Result<GenreGraph, AppError> {
    let docs: Vec<RecordDocument> = serde_json::from_str(json)?;
    Ok(GenreGraph::from_records(docs.into_iter().map(GenreRecord::from)))
}

pub fn load_records(path: &Path) -> Result<GenreGraph, AppError> {
    let json = fs::read_to_string(path)?;
    parse_records(&json)
}

/// Render a graph as a pretty-printed JSON array in record order.
pub fn records_to_json(graph: &GenreGraph) -> Result<String, AppError> {
    let docs: Vec<RecordDocument> = graph.records().map(RecordDocument::from).collect();
    Ok(serde_json::to_string_pretty(&docs)?)
}

/// Write a relation document.
///
/// The JSON is written to a sibling temporary file and renamed into place,
/// so an interrupted write never leaves a truncated document at `path`.
pub fn write_records(path: &Path, graph: &GenreGraph) -> Result<(), AppError> {
    let json = records_to_json(graph)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Ids of stubs whose name contains `needle` (case-insensitive), or all ids
/// when no needle is given.
pub fn select_ids(stubs: &[GenreStub], needle: Option<&str>) -> Vec<GenreId> {
    let needle = needle.map(str::to_lowercase);
    stubs
        .iter()
        .filter(|stub| match &needle {
            Some(n) => stub.name.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .map(|stub| stub.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUBS: &str = r#"{
        "genres": [
            { "id": "0e3fc579-2d24-4f20-9dae-736e1ec78798", "name": "rock", "artistCount": 120 },
            { "id": "1b50083b-1afa-4778-82c8-548b309af783", "name": "Black Metal" },
            { "id": "cc38aab3-ec4c-4a9d-8f8d-6a2a2a4c9bd4", "name": "death metal", "artistCount": 3 }
        ]
    }"#;

    #[test]
    fn parses_stub_document() {
        let stubs = parse_stubs(STUBS).unwrap();
        assert_eq!(stubs.len(), 3);
        assert_eq!(stubs[0].name, "rock");
        assert_eq!(stubs[0].artist_count, 120);
        assert_eq!(stubs[1].artist_count, 0);
    }

    #[test]
    fn rejects_unparsable_stub_documents() {
        for bad in [
            "",
            "not json",
            r#"{"genre": []}"#,
            r#"{"genres": [{"name": "rock"}]}"#,
            r#"{"genres": [{"id": "rock", "name": "rock"}]}"#,
            r#"{"genres": [{"id": "0e3fc579-2d24-4f20-9dae-736e1ec78798", "name": "rock", "artistCount": -1}]}"#,
        ] {
            assert!(
                matches!(parse_stubs(bad), Err(AppError::SerializationError(_))),
                "expected failure for {bad:?}"
            );
        }
    }

    #[test]
    fn record_document_fills_missing_relations() {
        let json = r#"[{
            "id": "0e3fc579-2d24-4f20-9dae-736e1ec78798",
            "name": "rock",
            "artistCount": 5,
            "wikipedia": null,
            "subgenres": [{ "id": "1b50083b-1afa-4778-82c8-548b309af783", "name": "black metal" }]
        }]"#;
        let graph = parse_records(json).unwrap();
        let record = graph.records().next().unwrap();
        assert_eq!(record.relations.get(RelationCategory::Subgenres).len(), 1);
        assert_eq!(record.relations.edge_count(), 1);
    }

    #[test]
    fn output_has_all_six_fields_in_order() {
        let stubs = parse_stubs(STUBS).unwrap();
        let graph = GenreGraph::from_records(stubs.iter().map(GenreRecord::empty));
        let json = records_to_json(&graph).unwrap();
        let first_record = &json[..json.find('}').unwrap()];
        let positions: Vec<usize> = [
            "\"id\"",
            "\"name\"",
            "\"artistCount\"",
            "\"subgenre_of\"",
            "\"subgenres\"",
            "\"fusion_genres\"",
            "\"fusion_of\"",
            "\"influenced_by\"",
            "\"influenced_genres\"",
        ]
        .iter()
        .map(|key| first_record.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[2]["name"], "death metal");
        assert_eq!(value[1]["subgenres"], serde_json::json!([]));
    }

    #[test]
    fn select_ids_filters_by_name() {
        let stubs = parse_stubs(STUBS).unwrap();
        assert_eq!(select_ids(&stubs, None).len(), 3);

        let metal = select_ids(&stubs, Some("METAL"));
        assert_eq!(metal, vec![stubs[1].id, stubs[2].id]);
        assert!(select_ids(&stubs, Some("jazz")).is_empty());
    }
}
