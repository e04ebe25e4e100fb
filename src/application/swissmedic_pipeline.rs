//! Swissmedic batch recalls and DHPC/HPC communications
//!
//! list page -> publication teasers -> detail pages -> merged records
//! -> registration-number enrichment -> JSON array

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

use super::packages_enrichment::{apply_custom_mapping, enrich_swissmedic_records};
use crate::domain::{DuplicateCheck, SwissmedicRecord};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::output::write_json;
use crate::infrastructure::parsing::swissmedic_parser::{DetailPage, ListItem, SwissmedicDetailParser, SwissmedicListParser};

/// One list page and where its records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwissmedicSource {
    pub name: &'static str,
    pub url: String,
    pub output: PathBuf,
}

impl SwissmedicSource {
    /// Batch recalls and DHPC/HPC communications, German and French
    pub fn all(config: &AppConfig) -> Vec<Self> {
        let sources = &config.sources;
        [
            ("chargenrueckrufe_de", &sources.swissmedic_recalls_de),
            ("chargenrueckrufe_fr", &sources.swissmedic_recalls_fr),
            ("dhpc_hpc_de", &sources.swissmedic_dhpc_de),
            ("dhpc_hpc_fr", &sources.swissmedic_dhpc_fr),
        ]
        .into_iter()
        .map(|(name, url)| Self {
            name,
            url: url.clone(),
            output: config.output_path(&format!("{name}.json")),
        })
        .collect()
    }
}

/// Optional enrichment inputs
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub packages_xlsx: Option<PathBuf>,
    pub custom_mapping: Option<PathBuf>,
    pub duplicate_check: DuplicateCheck,
}

pub struct SwissmedicPipeline {
    http: HttpClient,
    list_parser: SwissmedicListParser,
    detail_parser: SwissmedicDetailParser,
    enrichment: Enrichment,
}

impl SwissmedicPipeline {
    pub fn new(http: HttpClient, enrichment: Enrichment) -> Result<Self> {
        Ok(Self {
            http,
            list_parser: SwissmedicListParser::new()?,
            detail_parser: SwissmedicDetailParser::new()?,
            enrichment,
        })
    }

    /// Publication teasers of a list page, navigation teasers removed
    pub async fn scrape_list(&self, url: &str) -> Result<Vec<ListItem>> {
        let page = self.http.get_text(url).await?;
        let items = self.list_parser.parse(&page, url)?;
        Ok(items.into_iter().filter(ListItem::is_publication).collect())
    }

    async fn scrape_detail(&self, url: &str) -> Result<DetailPage> {
        let page = self.http.get_text(url).await?;
        Ok(self.detail_parser.parse(&page, url)?)
    }

    /// Detail pages by URL, fetched one after another. Failures are logged
    /// and leave the URL out of the map.
    pub async fn scrape_details<'a, I>(&self, urls: I) -> HashMap<String, DetailPage>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut details = HashMap::new();
        for url in urls {
            if details.contains_key(url) {
                continue;
            }
            info!("Fetching {}", url);
            match self.scrape_detail(url).await {
                Ok(detail) => {
                    details.insert(url.to_string(), detail);
                }
                Err(e) => error!("Failed to fetch detail page {}: {:#}", url, e),
            }
        }
        details
    }

    /// Scrape list and details of `url` into merged, enriched records
    pub async fn scrape(&self, url: &str) -> Result<Vec<SwissmedicRecord>> {
        let items = self.scrape_list(url).await?;
        info!("Received {} items", items.len());

        let details = self
            .scrape_details(items.iter().filter_map(|item| item.url.as_deref()))
            .await;

        let mut records: Vec<SwissmedicRecord> = items
            .into_iter()
            .map(|item| {
                // repeated URLs share one detail page
                let detail = item.url.as_ref().and_then(|u| details.get(u).cloned());
                item.into_record(detail)
            })
            .collect();

        self.enrich(&mut records).await;
        Ok(records)
    }

    async fn enrich(&self, records: &mut [SwissmedicRecord]) {
        let check = self.enrichment.duplicate_check;
        if let Some(path) = &self.enrichment.packages_xlsx {
            enrich_swissmedic_records(path, records, check);
        }
        if let Some(path) = &self.enrichment.custom_mapping {
            apply_custom_mapping(path, records, check).await;
        }
    }

    pub async fn run_source(&self, source: &SwissmedicSource) -> Result<usize> {
        info!("Fetching {}", source.name);
        let records = self
            .scrape(&source.url)
            .await
            .with_context(|| format!("Failed to scrape {}", source.name))?;
        write_json(&source.output, &records).await?;
        info!("Done {}: {} records", source.name, records.len());
        Ok(records.len())
    }

    /// Run every source; one failing source does not stop the others
    pub async fn run_all(&self, sources: &[SwissmedicSource]) -> Result<usize> {
        let mut written = 0;
        let mut failures = 0;
        for source in sources {
            match self.run_source(source).await {
                Ok(count) => written += count,
                Err(e) => {
                    error!("{:#}", e);
                    failures += 1;
                }
            }
        }
        if failures == sources.len() && !sources.is_empty() {
            anyhow::bail!("All {} Swissmedic sources failed", failures);
        }
        Ok(written)
    }
}

/// Ad-hoc list URL written to `output`
pub fn single_source(url: &str, output: &Path) -> SwissmedicSource {
    SwissmedicSource {
        name: "custom",
        url: url.to_string(),
        output: output.to_path_buf(),
    }
}
