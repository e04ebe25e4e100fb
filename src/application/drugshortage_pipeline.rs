//! drugshortage.ch overview -> JSON array of joined shortage entries

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::drugshortage::Drugshortage;
use crate::infrastructure::config::sources::DRUGSHORTAGE_OVERVIEW;
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::output::write_json;
use crate::infrastructure::parsing::drugshortage_parser::DrugshortageParser;

pub struct DrugshortagePipeline {
    http: HttpClient,
    parser: DrugshortageParser,
    overview_url: String,
}

impl DrugshortagePipeline {
    /// `root_url` is the site root; the overview page and detail links hang off it
    pub fn new(http: HttpClient, root_url: &str) -> Result<Self> {
        Ok(Self {
            http,
            parser: DrugshortageParser::new(root_url)?,
            overview_url: format!("{root_url}{DRUGSHORTAGE_OVERVIEW}"),
        })
    }

    pub async fn scrape(&self) -> Result<Vec<Drugshortage>> {
        info!("Fetching Drugshortage");
        let page = self
            .http
            .get_text(&self.overview_url)
            .await
            .context("Failed to fetch drug shortage overview")?;
        info!("Fetched Drugshortage");
        Ok(self.parser.parse(&page)?)
    }

    pub async fn run(&self, output: &Path) -> Result<usize> {
        info!("Running Drugshortage");
        let shortages = self.scrape().await?;
        write_json(output, &shortages).await?;
        info!("Done: {} shortages", shortages.len());
        Ok(shortages.len())
    }
}
