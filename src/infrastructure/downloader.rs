//! Conditional file download
//!
//! A cached file is considered current when its size equals the
//! `Content-Length` the server announces for a HEAD request. Nothing else
//! (dates, ETags) is compared.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use super::http_client::HttpClient;

/// Whether a download actually happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Unchanged,
    Downloaded { bytes: u64 },
}

/// Download `url` to `path` unless the local copy already has the announced size
pub async fn download_if_changed(client: &HttpClient, url: &str, path: &Path) -> Result<DownloadOutcome> {
    let content_length = client
        .head_content_length(url)
        .await
        .with_context(|| format!("HEAD request failed for {url}"))?;

    match fs::metadata(path).await {
        Ok(meta) if content_length == Some(meta.len()) => {
            info!("No need to download {}", path.display());
            return Ok(DownloadOutcome::Unchanged);
        }
        Ok(_) => {}
        Err(e) => info!("Cannot read existing {}: {}", path.display(), e),
    }

    info!(
        "Downloading {} (size: {})",
        path.display(),
        content_length.map_or_else(|| "unknown".to_string(), |n| n.to_string())
    );

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    match stream_to_file(client, url, path).await {
        Ok(bytes) => {
            info!("Downloaded {} bytes to {}", bytes, path.display());
            Ok(DownloadOutcome::Downloaded { bytes })
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(path).await {
                warn!("Failed to remove partial download {}: {}", path.display(), remove_err);
            }
            Err(e)
        }
    }
}

async fn stream_to_file(client: &HttpClient, url: &str, path: &Path) -> Result<u64> {
    let response = client.get(url).await?;
    let mut file = fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {}", path.display()))?;

    let mut written = 0u64;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.with_context(|| format!("Failed to read response body from {url}"))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Local file name for a download URL: the last path segment, percent-decoded
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).with_context(|| format!("Invalid URL: {url}"))?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("URL has no file name: {url}"))?;
    let decoded = urlencoding::decode(segment).with_context(|| format!("Invalid percent-encoding in {segment}"))?;
    Ok(decoded.into_owned())
}

/// `dir/<file name of url>`
pub fn target_path(dir: &Path, url: &str) -> Result<PathBuf> {
    Ok(dir.join(file_name_from_url(url)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::sources;

    #[test]
    fn decodes_migel_file_name() {
        let name = file_name_from_url(sources::MIGEL_XLSX).unwrap();
        assert_eq!(name, "Mittel- und Gegenständeliste vom 01.01.2022 in Excel Format.pdf.xlsx");
    }

    #[test]
    fn packages_file_name() {
        assert_eq!(file_name_from_url(sources::PACKAGES_XLSX).unwrap(), "zugelassene_packungen_ham.xlsx");
    }

    #[test]
    fn rejects_url_without_file() {
        assert!(file_name_from_url("https://example.org/").is_err());
    }
}
