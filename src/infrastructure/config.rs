//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. Optional TOML file (`scraper.toml` in the working directory, or `--config`)
//! 3. Environment variables prefixed with `SWISS_PHARMA`, `__` between sections
//!    (e.g. `SWISS_PHARMA_RECONCILE__FAILURE_POLICY=abort`)

#![allow(clippy::module_name_repetitions)]

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::DuplicateCheck;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub paths: PathsConfig,
    pub sources: SourcesConfig,
    pub reconcile: ReconcileConfig,
    pub logging: LoggingConfig,
}

/// HTTP client behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Upper bound for sequential requests; the scrapers never run requests in parallel
    pub max_requests_per_second: u32,
}

/// Where inputs are cached and artifacts written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Exact title -> registration number overrides for Swissmedic records
    pub custom_mapping: PathBuf,
}

/// Remote endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    pub packages_xlsx_url: String,
    pub migel_xlsx_url: String,
    /// Article lookup per position number; `{{positionNumber}}` is substituted
    pub migel_lookup_url: Option<String>,
    pub drugshortage_root: String,
    pub swissreg_base: String,
    pub swissmedic_recalls_de: String,
    pub swissmedic_recalls_fr: String,
    pub swissmedic_dhpc_de: String,
    pub swissmedic_dhpc_fr: String,
}

/// What the certificate reconciler does when one registration number fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log, remember the number, continue with the next one
    #[default]
    SkipItem,
    /// Stop the run after writing what was collected so far
    Abort,
}

/// Reconciliation knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub search_page_size: usize,
    pub failure_policy: FailurePolicy,
    pub duplicate_check: DuplicateCheck,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,
    /// Enable console output
    pub console_output: bool,
    /// Enable file output (daily rolling file in `directory`)
    pub file_output: bool,
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            custom_mapping: PathBuf::from("input").join("swissmedic-custom-mapping.json"),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            packages_xlsx_url: sources::PACKAGES_XLSX.to_string(),
            migel_xlsx_url: sources::MIGEL_XLSX.to_string(),
            migel_lookup_url: None,
            drugshortage_root: sources::DRUGSHORTAGE_ROOT.to_string(),
            swissreg_base: sources::SWISSREG_BASE.to_string(),
            swissmedic_recalls_de: sources::SWISSMEDIC_RECALLS_DE.to_string(),
            swissmedic_recalls_fr: sources::SWISSMEDIC_RECALLS_FR.to_string(),
            swissmedic_dhpc_de: sources::SWISSMEDIC_DHPC_DE.to_string(),
            swissmedic_dhpc_fr: sources::SWISSMEDIC_DHPC_FR.to_string(),
        }
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            search_page_size: defaults::SEARCH_PAGE_SIZE,
            failure_policy: FailurePolicy::default(),
            duplicate_check: DuplicateCheck::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            console_output: true,
            file_output: false,
            directory: PathBuf::from("logs"),
            file_prefix: "swiss-pharma-scrape.log".to_string(),
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` (or `scraper.toml` if present), then environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = config::Config::try_from(&Self::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        builder = match path {
            Some(path) => builder.add_source(config::File::from(path)),
            None => builder.add_source(config::File::with_name(defaults::CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// The file [`AppConfig::load`] reads for `path`
    pub fn config_file(path: Option<&Path>) -> PathBuf {
        path.map_or_else(|| PathBuf::from(defaults::CONFIG_FILE), Path::to_path_buf)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reconcile.search_page_size == 0 {
            return Err(ConfigError::Validation {
                message: "reconcile.search_page_size must be greater than 0".to_string(),
            });
        }
        if self.http.max_requests_per_second == 0 {
            return Err(ConfigError::Validation {
                message: "http.max_requests_per_second must be greater than 0".to_string(),
            });
        }
        if self.http.timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                message: "http.timeout_seconds must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn input_path(&self, file_name: &str) -> PathBuf {
        self.paths.input_dir.join(file_name)
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.paths.output_dir.join(file_name)
    }
}

/// Remote source URLs
pub mod sources {
    pub const PACKAGES_XLSX: &str = "https://www.swissmedic.ch/dam/swissmedic/de/dokumente/internetlisten/zugelassene_packungen_human.xlsx.download.xlsx/zugelassene_packungen_ham.xlsx";

    pub const MIGEL_XLSX: &str = "https://www.bag.admin.ch/dam/bag/de/dokumente/kuv-leistungen/Mittel-%20und%20Gegenst%C3%A4ndeliste/migel01012022excelprov.xlsx.download.xlsx/Mittel-%20und%20Gegenst%C3%A4ndeliste%20vom%2001.01.2022%20in%20Excel%20Format.pdf.xlsx";

    pub const DRUGSHORTAGE_ROOT: &str = "https://drugshortage.ch/";

    /// Overview page, relative to the drug shortage root
    pub const DRUGSHORTAGE_OVERVIEW: &str = "UebersichtaktuelleLieferengpaesse2.aspx";

    pub const SWISSREG_BASE: &str = "https://www.swissreg.ch/database/resources";

    pub const SWISSMEDIC_RECALLS_DE: &str = "https://www.swissmedic.ch/swissmedic/de/home/humanarzneimittel/marktueberwachung/qualitaetsmaengel-und-chargenrueckrufe/chargenrueckrufe.html";
    pub const SWISSMEDIC_RECALLS_FR: &str = "https://www.swissmedic.ch/swissmedic/fr/home/humanarzneimittel/marktueberwachung/qualitaetsmaengel-und-chargenrueckrufe/chargenrueckrufe.html";
    pub const SWISSMEDIC_DHPC_DE: &str = "https://www.swissmedic.ch/swissmedic/de/home/humanarzneimittel/marktueberwachung/health-professional-communication--hpc-.html";
    pub const SWISSMEDIC_DHPC_FR: &str = "https://www.swissmedic.ch/swissmedic/fr/home/humanarzneimittel/marktueberwachung/health-professional-communication--hpc-.html";
}

/// Default values
pub mod defaults {
    pub const CONFIG_FILE: &str = "scraper.toml";
    pub const ENV_PREFIX: &str = "SWISS_PHARMA";

    pub const USER_AGENT: &str = "swiss-pharma-scrape/0.2";
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 60;
    pub const MAX_REQUESTS_PER_SECOND: u32 = 5;

    /// Page size the registry search is asked for
    pub const SEARCH_PAGE_SIZE: usize = 64;

    pub const LOG_LEVEL: &str = "info";

    pub const PACKAGES_FILE: &str = "zugelassene_packungen_ham.xlsx";
    pub const SWISSREG_OUTPUT: &str = "swissreg.json";
    pub const DRUGSHORTAGE_OUTPUT: &str = "drugshortage.json";
    pub const MIGEL_OUTPUT: &str = "migel.csv";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reconcile.search_page_size, 64);
        assert_eq!(config.reconcile.failure_policy, FailurePolicy::SkipItem);
        assert_eq!(config.reconcile.duplicate_check, DuplicateCheck::Exact);
    }

    #[test]
    fn config_file_falls_back_to_default_name() {
        assert_eq!(AppConfig::config_file(None), PathBuf::from(defaults::CONFIG_FILE));
        assert_eq!(AppConfig::config_file(Some(Path::new("prod.toml"))), PathBuf::from("prod.toml"));
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[reconcile]\nfailure_policy = \"abort\"\nduplicate_check = \"substring\"\n\n[http]\nmax_requests_per_second = 2"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.reconcile.failure_policy, FailurePolicy::Abort);
        assert_eq!(config.reconcile.duplicate_check, DuplicateCheck::Substring);
        assert_eq!(config.http.max_requests_per_second, 2);
        assert_eq!(config.reconcile.search_page_size, 64);
        assert_eq!(config.sources.swissreg_base, sources::SWISSREG_BASE);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[reconcile]\nsearch_page_size = 0").unwrap();

        let err = AppConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }
}
