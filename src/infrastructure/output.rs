//! Artifact writers (compact JSON, `;`-separated CSV)

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::fs;
use tracing::info;

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Serialize `value` as compact JSON into `path`, creating parent directories
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path).await?;
    let bytes = serde_json::to_vec(value).context("Failed to serialize output")?;
    info!("Writing to file: {}", path.display());
    fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Row-by-row CSV output; fields containing `;`, quotes or newlines are quoted
pub struct CsvSink {
    writer: csv::Writer<File>,
    rows: usize,
}

impl CsvSink {
    pub const DELIMITER: u8 = b';';

    pub async fn create(path: &Path) -> Result<Self> {
        ensure_parent(path).await?;
        let writer = csv::WriterBuilder::new()
            .delimiter(Self::DELIMITER)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self { writer, rows: 0 })
    }

    pub fn write_record<I, S>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.writer.write_record(record).context("Failed to write CSV record")?;
        self.rows += 1;
        Ok(())
    }

    /// Records written so far, header included
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<usize> {
        self.writer.flush().context("Failed to flush CSV output")?;
        Ok(self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn writes_compact_json_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("data.json");
        let mut map = BTreeMap::new();
        map.insert("b", 2);
        map.insert("a", 1);

        write_json(&path, &map).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[tokio::test]
    async fn writes_semicolon_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migel.csv");

        let mut sink = CsvSink::create(&path).await.unwrap();
        assert_eq!(sink.rows(), 0);
        sink.write_record(["Positions-Nr.", "Artikel"]).unwrap();
        assert_eq!(sink.rows(), 1);
        sink.write_record(["01.01.01.00.1", "Gaze; steril"]).unwrap();
        assert_eq!(sink.finish().unwrap(), 2);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Positions-Nr.;Artikel\n01.01.01.00.1;\"Gaze; steril\"\n");
    }
}
