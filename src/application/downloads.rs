//! Cached spreadsheet inputs

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::infrastructure::config::{defaults, AppConfig};
use crate::infrastructure::downloader::{download_if_changed, target_path, DownloadOutcome};
use crate::infrastructure::http_client::HttpClient;

/// `input/zugelassene_packungen_ham.xlsx`, refreshed when the remote size changed
pub async fn download_packages(http: &HttpClient, config: &AppConfig) -> Result<(PathBuf, DownloadOutcome)> {
    let path = config.input_path(defaults::PACKAGES_FILE);
    let outcome = download_if_changed(http, &config.sources.packages_xlsx_url, &path).await?;
    Ok((path, outcome))
}

/// MiGeL spreadsheet under its decoded remote file name in `input_dir`
pub async fn download_migel(http: &HttpClient, config: &AppConfig) -> Result<(PathBuf, DownloadOutcome)> {
    let url = &config.sources.migel_xlsx_url;
    let path = target_path(&config.paths.input_dir, url)?;
    let outcome = download_if_changed(http, url, &path).await?;
    Ok((path, outcome))
}

/// The packages spreadsheet if it exists locally
pub fn existing_packages(config: &AppConfig) -> Option<PathBuf> {
    let path = config.input_path(defaults::PACKAGES_FILE);
    Path::exists(&path).then_some(path)
}
