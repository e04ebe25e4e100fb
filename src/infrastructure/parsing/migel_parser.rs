//! Parser for MiGeL article lookup pages
//!
//! A lookup page may contain several tables; the article tables are the
//! ones whose first-column cell reads `Pharmacode`.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::{element_text, selector, ParsingResult};
use crate::domain::migel::ArticleLookup;

const ARTICLE_TABLE_MARKER: &str = "Pharmacode";

pub struct MigelLookupParser {
    first_cells: Selector,
    rows: Selector,
}

impl MigelLookupParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            first_cells: selector("table td:first-child")?,
            rows: selector("tr")?,
        })
    }

    /// Article headers and rows; `None` when the page has no article table
    pub fn parse(&self, page: &str) -> Option<ArticleLookup> {
        let html = Html::parse_document(page);

        let mut seen = HashSet::new();
        let bodies: Vec<ElementRef<'_>> = html
            .select(&self.first_cells)
            .filter(|td| element_text(td) == ARTICLE_TABLE_MARKER)
            .filter_map(|td| td.parent()?.parent().and_then(ElementRef::wrap))
            .filter(|body| seen.insert(body.id()))
            .collect();

        if bodies.is_empty() {
            warn!("No article table found");
            return None;
        }

        let mut headers = None;
        let mut rows = Vec::new();
        for body in bodies {
            let mut trs = body.select(&self.rows);
            if let Some(first) = trs.next() {
                headers = Some(row_strings(&first));
            }
            rows.extend(trs.map(|tr| row_strings(&tr)));
        }

        let Some(headers) = headers else {
            warn!("Cannot find header in article table");
            return None;
        };
        Some(ArticleLookup { headers, rows })
    }
}

fn row_strings(tr: &ElementRef<'_>) -> Vec<String> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .map(|cell| element_text(&cell).trim().to_string())
        .collect()
}
