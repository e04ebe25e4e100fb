//! Registration-number enrichment of Swissmedic records
//!
//! Two passes, both best effort:
//! 1. the packages spreadsheet, matched through the name/agent index
//! 2. an exact title -> number mapping file maintained by hand

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::domain::{DuplicateCheck, MatchError, MatchKind, PackageRow, RecordIndex, SwissmedicRecord};
use crate::infrastructure::spreadsheet;

/// Counts from one spreadsheet pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentReport {
    pub rows: usize,
    pub patched: usize,
    /// Rows that only matched after dropping the "um" suffix
    pub stem_matches: usize,
}

/// Patch `records` with every row that resolves through a fresh index
pub fn enrich_with_rows(
    records: &mut [SwissmedicRecord],
    rows: &[PackageRow],
    check: DuplicateCheck,
) -> Result<EnrichmentReport, MatchError> {
    let index = RecordIndex::build(records);
    debug!("Indexed {} keys over {} records", index.len(), records.len());

    let mut report = EnrichmentReport {
        rows: rows.len(),
        ..EnrichmentReport::default()
    };
    for row in rows {
        match index.patch_records(records, row, check)? {
            Some(kind) => {
                report.patched += 1;
                if kind == MatchKind::Stem {
                    report.stem_matches += 1;
                }
            }
            None => debug!("No record for {} / {}", row.name, row.active_agent),
        }
    }
    Ok(report)
}

fn read_and_enrich(packages_xlsx: &Path, records: &mut [SwissmedicRecord], check: DuplicateCheck) -> Result<EnrichmentReport> {
    let range = spreadsheet::first_worksheet(packages_xlsx)?;
    let rows = spreadsheet::package_rows(&range);
    Ok(enrich_with_rows(records, &rows, check)?)
}

/// Spreadsheet pass. Read failures are logged and leave the records untouched.
pub fn enrich_swissmedic_records(
    packages_xlsx: &Path,
    records: &mut [SwissmedicRecord],
    check: DuplicateCheck,
) -> Option<EnrichmentReport> {
    info!("Patching records with {}", packages_xlsx.display());
    match read_and_enrich(packages_xlsx, records, check) {
        Ok(report) => {
            info!("Patched {} records ({} via agent stem)", report.patched, report.stem_matches);
            Some(report)
        }
        Err(e) => {
            error!("Error during reading packages xlsx: {:#}", e);
            None
        }
    }
}

/// Registration number from a mapping value: a non-negative integer or a
/// string of digits, which is kept as written
fn mapping_number(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n.to_string()),
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())).then(|| s.to_string())
        }
        _ => None,
    }
}

/// Merge mapped numbers into records whose title matches a mapping key exactly
pub fn apply_title_mapping(mapping: &Map<String, Value>, records: &mut [SwissmedicRecord], check: DuplicateCheck) -> usize {
    let mut patched = 0;
    for record in records.iter_mut() {
        let Some(value) = mapping.get(&record.title) else {
            continue;
        };
        match mapping_number(value) {
            Some(number) => {
                record.append_reg_number_text(&number, check);
                patched += 1;
            }
            None => warn!("Ignoring mapping for '{}': {} is not a registration number", record.title, value),
        }
    }
    patched
}

async fn read_mapping(path: &Path) -> Result<Map<String, Value>> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a JSON object", path.display()))
}

/// Custom-mapping pass. A missing or malformed file skips the pass.
pub async fn apply_custom_mapping(path: &Path, records: &mut [SwissmedicRecord], check: DuplicateCheck) -> Option<usize> {
    match read_mapping(path).await {
        Ok(mapping) => {
            let patched = apply_title_mapping(&mapping, records, check);
            info!("Patched {} records with {}", patched, path.display());
            Some(patched)
        }
        Err(e) => {
            warn!("Mapping for titles not found: {:#}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PrepEntry, RegNumber};
    use serde_json::json;

    fn row(reg_number: RegNumber, name: &str, agent: &str) -> PackageRow {
        PackageRow {
            reg_number,
            name: name.into(),
            active_agent: agent.into(),
        }
    }

    #[test]
    fn enriches_matching_records() {
        let mut records = vec![
            SwissmedicRecord::with_title("Swissmedic – Aspirin Cardio (acidum)"),
            SwissmedicRecord::with_title("Chargenrückruf – Ancotil (Flucytosin)"),
            SwissmedicRecord::with_title("No dash here (acidum)"),
        ];
        let rows = vec![
            row(12345, "Aspirin Cardio 100", "acidum"),
            row(58271, "Ancotil 2.5 g", "flucytosinum"),
            row(99999, "Unknown", "acidum"),
        ];

        let report = enrich_with_rows(&mut records, &rows, DuplicateCheck::Exact).unwrap();

        assert_eq!(
            report,
            EnrichmentReport {
                rows: 3,
                patched: 2,
                stem_matches: 1
            }
        );
        assert_eq!(records[0].prep, vec![PrepEntry::new("Zulassungsnummer", "12345")]);
        assert_eq!(records[1].reg_numbers(), Some("58271"));
        assert!(records[2].prep.is_empty());
    }

    #[test]
    fn missing_spreadsheet_leaves_records_untouched() {
        let mut records = vec![SwissmedicRecord::with_title("Swissmedic – Aspirin Cardio (acidum)")];
        let report = enrich_swissmedic_records(Path::new("/nonexistent/packages.xlsx"), &mut records, DuplicateCheck::Exact);
        assert!(report.is_none());
        assert!(records[0].prep.is_empty());
    }

    #[test]
    fn title_mapping_accepts_numbers_and_numeric_strings() {
        let mapping = json!({
            "Exact Title": 999,
            "String Title": "12345",
            "Broken": "n/a",
        });
        let mapping = mapping.as_object().unwrap();
        let mut records = vec![
            SwissmedicRecord::with_title("Exact Title"),
            SwissmedicRecord::with_title("String Title"),
            SwissmedicRecord::with_title("Broken"),
            SwissmedicRecord::with_title("exact title"),
        ];

        let patched = apply_title_mapping(mapping, &mut records, DuplicateCheck::Exact);

        assert_eq!(patched, 2);
        assert_eq!(records[0].prep, vec![PrepEntry::new("Zulassungsnummer", "999")]);
        assert_eq!(records[1].reg_numbers(), Some("12345"));
        assert!(records[2].prep.is_empty());
        assert!(records[3].prep.is_empty());
    }

    #[test]
    fn title_mapping_keeps_leading_zeros() {
        let mapping = json!({ "Old Registration": "00274", "Spaced": " 01234 " });
        let mapping = mapping.as_object().unwrap();
        let mut records = vec![
            SwissmedicRecord::with_title("Old Registration"),
            SwissmedicRecord::with_title("Spaced"),
        ];
        records[1].append_reg_number(58271, DuplicateCheck::Exact);

        assert_eq!(apply_title_mapping(mapping, &mut records, DuplicateCheck::Exact), 2);
        assert_eq!(records[0].reg_numbers(), Some("00274"));
        assert_eq!(records[1].reg_numbers(), Some("58271,01234"));
    }

    #[tokio::test]
    async fn custom_mapping_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(&path, r#"{"Exact Title": 999}"#).unwrap();
        let mut records = vec![SwissmedicRecord::with_title("Exact Title")];

        assert_eq!(apply_custom_mapping(&path, &mut records, DuplicateCheck::Exact).await, Some(1));
        assert_eq!(records[0].reg_numbers(), Some("999"));

        // applying the same mapping twice does not duplicate the number
        apply_custom_mapping(&path, &mut records, DuplicateCheck::Exact).await;
        assert_eq!(records[0].reg_numbers(), Some("999"));
    }

    #[tokio::test]
    async fn malformed_mapping_skips_pass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let mut records = vec![SwissmedicRecord::with_title("Exact Title")];

        assert_eq!(apply_custom_mapping(&path, &mut records, DuplicateCheck::Exact).await, None);
        assert_eq!(apply_custom_mapping(&dir.path().join("missing.json"), &mut records, DuplicateCheck::Exact).await, None);
        assert!(records[0].prep.is_empty());
    }
}
