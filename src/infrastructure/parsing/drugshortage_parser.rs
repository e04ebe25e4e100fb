//! Parser for the drugshortage.ch overview page
//!
//! The overview carries three grids: current shortages (`GridView1`), the
//! company rating table (`GridView2`) and the colour legend (`GridView5`).
//! Every shortage is joined with its company by name and the company with its
//! colour by rating.

use std::collections::HashMap;

use scraper::{Html, Selector};
use tracing::{debug, warn};

use super::{selector, ParsingResult, TableExtractor};
use crate::domain::drugshortage::{parse_leading_int, Colour, Company, Drugshortage};

const SHORTAGE_TABLE: &str = "GridView1";
const COMPANY_TABLE: &str = "GridView2";
const COLOUR_TABLE: &str = "GridView5";

pub struct DrugshortageParser {
    root_url: String,
    shortages: TableExtractor,
    companies: TableExtractor,
    colours: TableExtractor,
    details_link: Selector,
}

impl DrugshortageParser {
    /// `root_url` is prefixed to the relative detail links, e.g. `https://drugshortage.ch/`
    pub fn new(root_url: &str) -> ParsingResult<Self> {
        Ok(Self {
            root_url: root_url.to_string(),
            shortages: TableExtractor::new(SHORTAGE_TABLE, 8)?,
            companies: TableExtractor::new(COMPANY_TABLE, 4)?,
            colours: TableExtractor::new(COLOUR_TABLE, 3)?,
            details_link: selector("td:nth-child(1) > a")?,
        })
    }

    /// Parse the overview page into joined shortage entries.
    ///
    /// A missing shortage grid is an error; missing lookup grids only leave
    /// the joins empty.
    pub fn parse(&self, page: &str) -> ParsingResult<Vec<Drugshortage>> {
        let html = Html::parse_document(page);

        let companies = self.parse_companies(&html).unwrap_or_else(|e| {
            warn!("Company table unavailable: {}", e);
            Vec::new()
        });
        debug!("Found {} companies", companies.len());
        let company_by_name: HashMap<&str, &Company> = companies.iter().map(|c| (c.name.as_str(), c)).collect();

        let colours = self.parse_colours(&html).unwrap_or_else(|e| {
            warn!("Colour table unavailable: {}", e);
            Vec::new()
        });
        debug!("Found {} colours", colours.len());
        let colour_by_number: HashMap<i64, &Colour> =
            colours.iter().filter_map(|c| c.number.map(|n| (n, c))).collect();

        let rows = self.shortages.body_rows(&html)?;
        let shortages = rows
            .iter()
            .enumerate()
            .map(|(id, row)| {
                let firma = self.shortages.cell_text(row, 4);
                let href = row
                    .select(&self.details_link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .unwrap_or_default();

                let company = company_by_name.get(firma.as_str()).map(|c| (*c).clone());
                if company.is_none() {
                    warn!("Cannot find company {}", firma);
                }
                let color_code = company
                    .as_ref()
                    .and_then(|c| c.rating)
                    .and_then(|rating| colour_by_number.get(&rating))
                    .map(|c| (*c).clone());
                if company.is_some() && color_code.is_none() {
                    warn!(
                        "Cannot find colour {:?} for {}",
                        company.as_ref().and_then(|c| c.rating),
                        firma
                    );
                }

                Drugshortage {
                    id,
                    bezeichnung: self.shortages.cell_text(row, 1),
                    details_link: format!("{}{}", self.root_url, href),
                    gtin: parse_leading_int(&self.shortages.cell_text(row, 2)),
                    pharmacode: parse_leading_int(&self.shortages.cell_text(row, 3)),
                    firma,
                    datum_letzte_mutation: self.shortages.cell_text(row, 5),
                    tage_seit_erster_meldung: parse_leading_int(&self.shortages.cell_text(row, 6)),
                    status: self.shortages.cell_text(row, 7),
                    datum_lieferfahigkeit: self.shortages.cell_text(row, 8),
                    company,
                    color_code,
                }
            })
            .collect();
        Ok(shortages)
    }

    fn parse_companies(&self, html: &Html) -> ParsingResult<Vec<Company>> {
        let table = &self.companies;
        Ok(table
            .body_rows(html)?
            .iter()
            .map(|row| Company {
                rating: parse_leading_int(&table.cell_text(row, 1)),
                name: table.cell_text(row, 2),
                registered_products: parse_leading_int(&table.cell_text(row, 3)),
                open_shortages: parse_leading_int(&table.cell_text(row, 4)),
            })
            .collect())
    }

    fn parse_colours(&self, html: &Html) -> ParsingResult<Vec<Colour>> {
        let table = &self.colours;
        Ok(table
            .body_rows(html)?
            .iter()
            .map(|row| Colour {
                number: parse_leading_int(&table.cell_text(row, 1)),
                rating: table.cell_text(row, 2),
                report_kind: table.cell_text(row, 3),
            })
            .collect())
    }
}
