//! Infrastructure layer: configuration, logging, HTTP, spreadsheets, HTML
//! parsing and artifact output.

pub mod config; // Layered configuration and constants
pub mod downloader;
pub mod http_client;
pub mod logging;
pub mod output;
pub mod parsing; // scraper-based page parsers
pub mod spreadsheet;
pub mod swissreg_client;

// Re-export commonly used items
pub use config::{AppConfig, FailurePolicy};
pub use downloader::{download_if_changed, DownloadOutcome};
pub use http_client::{FetchError, HttpClient};
pub use logging::init_logging_with_config;
pub use output::{write_json, CsvSink};
pub use parsing::{ParsingError, ParsingResult};
pub use swissreg_client::{CertificateRegistry, PageRequest, RegistryError, SwissregClient};
