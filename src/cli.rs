//! Command-line interface: one subcommand per pipeline

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::application::certificate_reconciler::load_reg_numbers;
use crate::application::downloads::{download_migel, download_packages, existing_packages};
use crate::application::swissmedic_pipeline::single_source;
use crate::application::{CertificateReconciler, DrugshortagePipeline, Enrichment, MigelPipeline, SwissmedicPipeline, SwissmedicSource};
use crate::infrastructure::config::{defaults, AppConfig};
use crate::infrastructure::http_client::HttpClient;
use crate::infrastructure::logging::init_logging_with_config;
use crate::infrastructure::swissreg_client::SwissregClient;

#[derive(Parser, Debug)]
#[command(
    name = "swiss-pharma-scrape",
    about = "Scrape Swiss drug registry sources and reconcile them into JSON/CSV artifacts",
    version
)]
pub struct Cli {
    /// Configuration file (defaults to ./scraper.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Current drug shortages from drugshortage.ch
    Drugshortage {
        /// Output JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Swissmedic batch recalls and DHPC/HPC communications
    Swissmedic {
        /// Scrape a single list page instead of the four configured sources
        #[arg(long, requires = "output")]
        url: Option<String>,
        /// Output JSON file for --url
        #[arg(long)]
        output: Option<PathBuf>,
        /// Packages spreadsheet used for registration-number enrichment
        #[arg(long)]
        packages: Option<PathBuf>,
        /// Exact title -> registration number mapping
        #[arg(long)]
        custom_mapping: Option<PathBuf>,
        /// Skip both enrichment passes
        #[arg(long)]
        no_enrich: bool,
    },
    /// Supplementary protection certificates from Swissreg
    Swissreg {
        /// Packages spreadsheet providing the registration numbers
        #[arg(long)]
        packages: Option<PathBuf>,
        /// Output JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Refresh the packages spreadsheet first
        #[arg(long)]
        download: bool,
    },
    /// MiGeL positions joined with their article lookups
    Migel {
        /// Output CSV file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Lookup URL template containing {{positionNumber}}
        #[arg(long)]
        lookup_url: Option<String>,
    },
    /// Download the Swissmedic packages spreadsheet if it changed
    DownloadPackages,
}

/// Load configuration, initialize logging and run the selected command
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging_with_config(&config.logging)?;
    info!("Configuration loaded (file: {})", AppConfig::config_file(cli.config.as_deref()).display());

    let http = HttpClient::new(config.http.clone())?;

    match cli.command {
        Commands::Drugshortage { output } => {
            let output = output.unwrap_or_else(|| config.output_path(defaults::DRUGSHORTAGE_OUTPUT));
            DrugshortagePipeline::new(http, &config.sources.drugshortage_root)?
                .run(&output)
                .await?;
        }
        Commands::Swissmedic {
            url,
            output,
            packages,
            custom_mapping,
            no_enrich,
        } => {
            let enrichment = if no_enrich {
                Enrichment {
                    duplicate_check: config.reconcile.duplicate_check,
                    ..Enrichment::default()
                }
            } else {
                Enrichment {
                    packages_xlsx: packages.or_else(|| existing_packages(&config)),
                    custom_mapping: Some(custom_mapping.unwrap_or_else(|| config.paths.custom_mapping.clone())),
                    duplicate_check: config.reconcile.duplicate_check,
                }
            };
            let pipeline = SwissmedicPipeline::new(http, enrichment)?;
            let sources = match (url, output) {
                (Some(url), Some(output)) => vec![single_source(&url, &output)],
                _ => SwissmedicSource::all(&config),
            };
            let written = pipeline.run_all(&sources).await?;
            info!("Wrote {} Swissmedic records", written);
        }
        Commands::Swissreg {
            packages,
            output,
            download,
        } => {
            let packages = match packages {
                Some(path) => path,
                None if download => download_packages(&http, &config).await?.0,
                None => config.input_path(defaults::PACKAGES_FILE),
            };
            let output = output.unwrap_or_else(|| config.output_path(defaults::SWISSREG_OUTPUT));

            let reg_numbers = load_reg_numbers(&packages)?;
            let client = SwissregClient::new(&config.sources.swissreg_base, config.http.clone())?;
            let report = CertificateReconciler::new(client, &config.reconcile)
                .run(&reg_numbers, &output)
                .await?;
            info!(
                "Searched {} registration numbers, {} certificates, {} failed",
                report.searched,
                report.certificates,
                report.failed.len()
            );
        }
        Commands::Migel { output, lookup_url } => {
            let template = lookup_url
                .or_else(|| config.sources.migel_lookup_url.clone())
                .context("No MiGeL lookup URL: pass --lookup-url or set sources.migel_lookup_url")?;
            let output = output.unwrap_or_else(|| config.output_path(defaults::MIGEL_OUTPUT));
            let (xlsx, _) = download_migel(&http, &config).await?;
            let report = MigelPipeline::new(http, &template)?.run(&xlsx, &output).await?;
            if !report.skipped.is_empty() {
                warn!("{} position numbers had no articles", report.skipped.len());
            }
        }
        Commands::DownloadPackages => {
            let (path, outcome) = download_packages(&http, &config).await?;
            info!("{}: {:?}", path.display(), outcome);
        }
    }
    Ok(())
}
