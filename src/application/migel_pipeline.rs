//! MiGeL spreadsheet + article lookups -> `;`-separated CSV

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::domain::migel::{group_by_position_number, ArticleLookup, MigelRow};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::output::CsvSink;
use crate::infrastructure::parsing::migel_parser::MigelLookupParser;
use crate::infrastructure::spreadsheet;

/// Placeholder in the lookup URL template
pub const POSITION_NUMBER_PLACEHOLDER: &str = "{{positionNumber}}";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigelReport {
    pub positions: usize,
    pub looked_up: usize,
    /// Position numbers without an article table or whose lookup failed
    pub skipped: Vec<String>,
    pub rows: usize,
}

pub struct MigelPipeline {
    http: HttpClient,
    parser: MigelLookupParser,
    lookup_url_template: String,
}

impl MigelPipeline {
    pub fn new(http: HttpClient, lookup_url_template: &str) -> Result<Self> {
        if !lookup_url_template.contains(POSITION_NUMBER_PLACEHOLDER) {
            anyhow::bail!("MiGeL lookup URL must contain {POSITION_NUMBER_PLACEHOLDER}: {lookup_url_template}");
        }
        Ok(Self {
            http,
            parser: MigelLookupParser::new()?,
            lookup_url_template: lookup_url_template.to_string(),
        })
    }

    pub fn lookup_url(&self, row: &MigelRow) -> String {
        self.lookup_url_template
            .replace(POSITION_NUMBER_PLACEHOLDER, &row.lookup_number())
    }

    /// Article table for one position, `None` when the page has none
    pub async fn lookup(&self, row: &MigelRow) -> Result<Option<ArticleLookup>> {
        let url = self.lookup_url(row);
        info!("Fetching {}", url);
        let page = self.http.get_text(&url).await?;
        Ok(self.parser.parse(&page))
    }

    /// Look up every grouped row and stream the CSV to `output`
    pub async fn run_rows(&self, rows: Vec<MigelRow>, output: &Path) -> Result<MigelReport> {
        let grouped = group_by_position_number(rows);
        info!("Found {} position numbers", grouped.len());

        let mut report = MigelReport {
            positions: grouped.len(),
            ..MigelReport::default()
        };
        let mut sink = CsvSink::create(output).await?;

        for row in &grouped {
            let lookup = match self.lookup(row).await {
                Ok(Some(lookup)) => lookup,
                Ok(None) => {
                    warn!("Cannot look up for: {}", row.position_number);
                    report.skipped.push(row.position_number.clone());
                    continue;
                }
                Err(e) => {
                    error!("Lookup failed for {}: {:#}", row.position_number, e);
                    report.skipped.push(row.position_number.clone());
                    continue;
                }
            };
            info!("Found {} for {}", lookup.rows.len(), row.position_number);
            report.looked_up += 1;

            if sink.rows() == 0 {
                sink.write_record(lookup.csv_header())?;
            }
            for article in &lookup.rows {
                sink.write_record(row.csv_record(article))?;
                report.rows += 1;
            }
        }

        sink.finish()?;
        info!("Wrote {} article rows to {}", report.rows, output.display());
        Ok(report)
    }

    /// Read the downloaded spreadsheet and run the lookups
    pub async fn run(&self, migel_xlsx: &Path, output: &Path) -> Result<MigelReport> {
        let range = spreadsheet::first_worksheet(migel_xlsx)
            .with_context(|| format!("Failed to read MiGeL spreadsheet {}", migel_xlsx.display()))?;
        let rows = spreadsheet::migel_rows(&range);
        self.run_rows(rows, output).await
    }
}
