//! Extraction results and record assembly.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{GenreRecord, GenreStub, RelationCategory, RelationEdge, Relations};

/// Which structural part of a genre page was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSection {
    /// No `h2.relationships` heading.
    Relationships,
    /// Heading present but no `table.details` after it.
    DetailsTable,
}

impl fmt::Display for MissingSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingSection::Relationships => write!(f, "no relationships section"),
            MissingSection::DetailsTable => {
                write!(f, "no details table after relationships section")
            }
        }
    }
}

/// Outcome of parsing one genre page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The fetch failed; there was nothing to parse.
    NoContent,
    /// The page has no usable relationships table.
    Missing(MissingSection),
    /// Edges per matched row. Categories whose row was absent are not keys.
    Found(BTreeMap<RelationCategory, Vec<RelationEdge>>),
}

/// Merge a stub with its extracted relations into a complete record.
///
/// Categories the extraction did not mention come out empty.
pub fn assemble(stub: &GenreStub, extraction: Extraction) -> GenreRecord {
    let mut record = GenreRecord::empty(stub);
    if let Extraction::Found(rows) = extraction {
        record.relations = rows
            .into_iter()
            .fold(Relations::default(), |relations, (category, edges)| {
                relations.with(category, edges)
            });
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenreId;

    fn id(n: u8) -> GenreId {
        GenreId::parse(&format!("00000000-0000-0000-0000-0000000000{n:02x}")).unwrap()
    }

    fn stub() -> GenreStub {
        GenreStub::new(id(1), "shoegaze").with_artist_count(12)
    }

    #[test]
    fn assembles_partial_extraction_with_all_categories() {
        let mut rows = BTreeMap::new();
        rows.insert(
            RelationCategory::SubgenreOf,
            vec![RelationEdge::new(id(2), "alternative rock")],
        );
        let record = assemble(&stub(), Extraction::Found(rows));

        assert_eq!(record.id, id(1));
        assert_eq!(record.name, "shoegaze");
        assert_eq!(record.artist_count, 12);
        assert_eq!(
            record.relations.get(RelationCategory::SubgenreOf),
            &[RelationEdge::new(id(2), "alternative rock")]
        );
        for category in RelationCategory::ALL {
            if category != RelationCategory::SubgenreOf {
                assert!(record.relations.get(category).is_empty());
            }
        }
    }

    #[test]
    fn no_content_and_missing_sections_are_empty() {
        for extraction in [
            Extraction::NoContent,
            Extraction::Missing(MissingSection::Relationships),
            Extraction::Missing(MissingSection::DetailsTable),
        ] {
            let record = assemble(&stub(), extraction);
            assert!(record.relations.is_empty());
            assert_eq!(record.relations.iter().count(), 6);
        }
    }

    #[test]
    fn matched_row_with_no_links_is_empty() {
        let mut rows = BTreeMap::new();
        rows.insert(RelationCategory::InfluencedBy, Vec::new());
        let extraction = Extraction::Found(rows);
        assert_eq!(assemble(&stub(), extraction), GenreRecord::empty(&stub()));
    }
}
