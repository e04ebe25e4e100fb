//! MiGeL (Mittel- und Gegenständeliste) positions and article lookups

use std::collections::HashSet;

use tracing::debug;

/// Row of the MiGeL spreadsheet that matters for the export
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigelRow {
    pub position_number: String,
    pub hvb_self_application: String,
    pub hvb_care: String,
}

/// Article table scraped for one position number
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleLookup {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Leading CSV columns, followed by the lookup table's own headers
pub const CSV_PREFIX_HEADERS: [&str; 3] = ["Positions-Nr.", "HVB Selbstanwendung", "HVB Pflege"];

/// Keep the first row per position number, preserving spreadsheet order.
///
/// Rows without a position number are dropped.
pub fn group_by_position_number(rows: Vec<MigelRow>) -> Vec<MigelRow> {
    let mut seen = HashSet::new();
    let mut grouped = Vec::new();
    for row in rows {
        if row.position_number.is_empty() {
            continue;
        }
        if seen.insert(row.position_number.clone()) {
            grouped.push(row);
        } else {
            debug!("Repeated position number: {}", row.position_number);
        }
    }
    grouped
}

impl MigelRow {
    /// Number as used in the lookup URL, e.g. `01.01.01.00.1` -> `010101001`
    pub fn lookup_number(&self) -> String {
        self.position_number.replace('.', "")
    }

    /// CSV record for one article row of this position
    pub fn csv_record(&self, article: &[String]) -> Vec<String> {
        let mut record = Vec::with_capacity(article.len() + CSV_PREFIX_HEADERS.len());
        record.push(self.position_number.clone());
        record.push(self.hvb_self_application.clone());
        record.push(self.hvb_care.clone());
        record.extend(article.iter().cloned());
        record
    }
}

impl ArticleLookup {
    pub fn csv_header(&self) -> Vec<String> {
        CSV_PREFIX_HEADERS
            .iter()
            .map(|h| (*h).to_string())
            .chain(self.headers.iter().cloned())
            .collect()
    }
}
