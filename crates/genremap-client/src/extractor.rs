use std::collections::BTreeMap;

use genremap_core::error::AppError;
use genremap_core::models::{GenreId, RelationCategory, RelationEdge};
use genremap_core::record::{Extraction, MissingSection};
use genremap_core::traits::RelationExtractor;
use scraper::{ElementRef, Html, Selector};

const GENRE_PATH: &str = "/genre/";

/// Relationship extractor for MusicBrainz genre pages.
///
/// Finds the `h2.relationships` heading, the `table.details` that follows it
/// within the same section, and reads every row whose heading names one of
/// the six relation categories.
#[derive(Clone)]
pub struct MusicBrainzExtractor {
    heading: Selector,
    details: Selector,
    section_break: Selector,
    row: Selector,
    label_cell: Selector,
    content_cell: Selector,
    link: Selector,
    inline_name: Selector,
}

fn selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css)
        .map_err(|e| AppError::ExtractorError(format!("Invalid selector '{css}': {e}")))
}

impl MusicBrainzExtractor {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            heading: selector("h2.relationships")?,
            details: selector("table.details")?,
            section_break: selector("h2")?,
            row: selector("tr")?,
            label_cell: selector("th")?,
            content_cell: selector("td")?,
            link: selector("a[href]")?,
            inline_name: selector("bdi")?,
        })
    }

    /// The first `table.details` sibling after `heading`, before the next
    /// `h2` starts another section.
    fn details_table<'a>(&self, heading: ElementRef<'a>) -> Option<ElementRef<'a>> {
        heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|el| !self.section_break.matches(el))
            .find(|el| self.details.matches(el))
    }

    /// Genre links in a content cell, in document order.
    fn links(&self, cell: ElementRef<'_>) -> Vec<RelationEdge> {
        cell.select(&self.link)
            .filter_map(|a| {
                let id = a.value().attr("href").and_then(genre_id_from_href)?;
                let name = match a.select(&self.inline_name).next() {
                    Some(bdi) => element_text(bdi),
                    None => element_text(a),
                };
                Some(RelationEdge::new(id, name))
            })
            .collect()
    }
}

impl RelationExtractor for MusicBrainzExtractor {
    fn extract(&self, page: Option<&str>) -> Extraction {
        let Some(html) = page else {
            return Extraction::NoContent;
        };
        let document = Html::parse_document(html);

        let Some(heading) = document.select(&self.heading).next() else {
            return Extraction::Missing(MissingSection::Relationships);
        };
        let Some(table) = self.details_table(heading) else {
            return Extraction::Missing(MissingSection::DetailsTable);
        };

        let mut rows = BTreeMap::new();
        for row in table.select(&self.row) {
            let (Some(label), Some(content)) = (
                row.select(&self.label_cell).next(),
                row.select(&self.content_cell).next(),
            ) else {
                continue;
            };
            let Some(category) = RelationCategory::from_heading(&element_text(label)) else {
                tracing::trace!(label = %element_text(label), "Ignoring relationship row");
                continue;
            };
            rows.insert(category, self.links(content));
        }
        Extraction::Found(rows)
    }
}

/// Pull a genre id out of a link target such as `/genre/<id>` or
/// `https://musicbrainz.org/genre/<id>/aliases`.
fn genre_id_from_href(href: &str) -> Option<GenreId> {
    href.match_indices(GENRE_PATH).find_map(|(i, _)| {
        let start = i + GENRE_PATH.len();
        href.get(start..start + GenreId::LEN).and_then(GenreId::parse)
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
