use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// MusicBrainz genre identifier.
///
/// Always the 36-character hyphenated (8-4-4-4-12) form. Parsing accepts
/// either hex case; display is lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GenreId(Uuid);

impl GenreId {
    /// Length of the hyphenated identifier.
    pub const LEN: usize = 36;

    pub fn parse(s: &str) -> Option<Self> {
        if s.len() != Self::LEN {
            return None;
        }
        Uuid::try_parse(s).ok().map(Self)
    }
}

impl fmt::Display for GenreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for GenreId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid genre id: {s:?}"))
    }
}

impl TryFrom<String> for GenreId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GenreId> for String {
    fn from(id: GenreId) -> Self {
        id.to_string()
    }
}

/// Minimal genre reference loaded from the input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreStub {
    pub id: GenreId,
    pub name: String,
    #[serde(rename = "artistCount", default)]
    pub artist_count: u64,
}

impl GenreStub {
    pub fn new(id: GenreId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            artist_count: 0,
        }
    }

    pub fn with_artist_count(mut self, count: u64) -> Self {
        self.artist_count = count;
        self
    }
}

/// The six directed relationship kinds listed on a genre page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationCategory {
    SubgenreOf,
    Subgenres,
    FusionGenres,
    FusionOf,
    InfluencedBy,
    InfluencedGenres,
}

impl RelationCategory {
    /// All categories, in output field order.
    pub const ALL: [RelationCategory; 6] = [
        RelationCategory::SubgenreOf,
        RelationCategory::Subgenres,
        RelationCategory::FusionGenres,
        RelationCategory::FusionOf,
        RelationCategory::InfluencedBy,
        RelationCategory::InfluencedGenres,
    ];

    /// Field name in the output document.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationCategory::SubgenreOf => "subgenre_of",
            RelationCategory::Subgenres => "subgenres",
            RelationCategory::FusionGenres => "fusion_genres",
            RelationCategory::FusionOf => "fusion_of",
            RelationCategory::InfluencedBy => "influenced_by",
            RelationCategory::InfluencedGenres => "influenced_genres",
        }
    }

    /// Row heading on the genre page, lowercase and including the colon.
    pub fn label(&self) -> &'static str {
        match self {
            RelationCategory::SubgenreOf => "subgenre of:",
            RelationCategory::Subgenres => "subgenres:",
            RelationCategory::FusionGenres => "has fusion genres:",
            RelationCategory::FusionOf => "fusion of:",
            RelationCategory::InfluencedBy => "influenced by:",
            RelationCategory::InfluencedGenres => "influenced genres:",
        }
    }

    /// Map a table row heading to its category.
    ///
    /// The heading is trimmed and lowercased, then compared for exact
    /// equality against the known labels. Anything else is `None`.
    pub fn from_heading(heading: &str) -> Option<Self> {
        match heading.trim().to_lowercase().as_str() {
            "subgenre of:" => Some(RelationCategory::SubgenreOf),
            "subgenres:" => Some(RelationCategory::Subgenres),
            "has fusion genres:" => Some(RelationCategory::FusionGenres),
            "fusion of:" => Some(RelationCategory::FusionOf),
            "influenced by:" => Some(RelationCategory::InfluencedBy),
            "influenced genres:" => Some(RelationCategory::InfluencedGenres),
            _ => None,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RelationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A directed edge to another genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub id: GenreId,
    pub name: String,
}

impl RelationEdge {
    pub fn new(id: GenreId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Edge sequences for all six categories. Every category is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    edges: [Vec<RelationEdge>; 6],
}

impl Relations {
    pub fn get(&self, category: RelationCategory) -> &[RelationEdge] {
        &self.edges[category.index()]
    }

    pub fn set(&mut self, category: RelationCategory, edges: Vec<RelationEdge>) {
        self.edges[category.index()] = edges;
    }

    pub fn with(mut self, category: RelationCategory, edges: Vec<RelationEdge>) -> Self {
        self.set(category, edges);
        self
    }

    /// Iterate categories in output order with their edges.
    pub fn iter(&self) -> impl Iterator<Item = (RelationCategory, &[RelationEdge])> {
        RelationCategory::ALL
            .into_iter()
            .map(move |category| (category, self.get(category)))
    }

    /// Keep only edges matching `keep` in every category. Survivor order is
    /// unchanged. Returns the number of edges removed.
    pub fn retain<P>(&mut self, mut keep: P) -> usize
    where
        P: FnMut(&RelationEdge) -> bool,
    {
        let mut removed = 0;
        for edges in &mut self.edges {
            let before = edges.len();
            edges.retain(|edge| keep(edge));
            removed += before - edges.len();
        }
        removed
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.iter().all(Vec::is_empty)
    }
}

/// A fully assembled genre with its relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenreRecord {
    pub id: GenreId,
    pub name: String,
    pub artist_count: u64,
    pub relations: Relations,
}

impl GenreRecord {
    /// A record with all six categories empty.
    pub fn empty(stub: &GenreStub) -> Self {
        Self {
            id: stub.id,
            name: stub.name.clone(),
            artist_count: stub.artist_count,
            relations: Relations::default(),
        }
    }
}
