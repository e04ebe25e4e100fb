//! Name / active-agent index over Swissmedic records
//!
//! Scraped titles look like `"Chargenrückruf – Aspirin Cardio (acidum)"`: the
//! product name follows the first en-dash and the active agent is the first
//! purely alphabetic token in parentheses. Spreadsheet rows carry the same
//! two pieces in separate columns, so both sides are reduced to the key
//! `"{name}/{agent}"` (lowercase) and joined through a hash map.
//!
//! The index holds record *positions*. It is a snapshot of one collection:
//! patching a collection of a different size, or one whose matched records no
//! longer carry the indexed title key, is refused.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::record::{DuplicateCheck, RegNumber, SwissmedicRecord};

static ACTIVE_AGENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([a-zA-Z]+)\)").expect("static regex"));

const EN_DASH: char = '–';

/// Latin nominative ending the packages spreadsheet uses ("flucytosinum")
const LATIN_SUFFIX: &str = "um";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("index was built for {indexed} records but the collection has {actual}")]
    StaleIndex { indexed: usize, actual: usize },
    #[error("record {position} no longer carries the indexed key '{key}'")]
    RetitledRecord { position: usize, key: String },
}

/// A `(registration number, name, active agent)` row of the packages spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRow {
    pub reg_number: RegNumber,
    pub name: String,
    pub active_agent: String,
}

/// Which key resolved a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Primary,
    /// Matched after dropping the trailing "um" of the active agent
    Stem,
}

/// Leading run of ASCII letters and digits, `None` when there is none
fn leading_alnum(input: &str) -> Option<&str> {
    let end = input
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(input.len());
    (end > 0).then(|| &input[..end])
}

fn compose_key(name: &str, active_agent: &str) -> String {
    format!("{name}/{active_agent}").to_lowercase()
}

/// Index key of a record title, or `None` if the title lacks a name or an agent
pub fn title_key(title: &str) -> Option<String> {
    let segment = title.split(EN_DASH).nth(1).unwrap_or("");
    let name = leading_alnum(segment.trim())?;
    let agent = ACTIVE_AGENT_RE.captures(title)?.get(1)?.as_str();
    Some(compose_key(name, agent))
}

/// Immutable `key -> record positions` snapshot
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    entries: HashMap<String, BTreeSet<usize>>,
    record_count: usize,
}

impl RecordIndex {
    pub fn build(records: &[SwissmedicRecord]) -> Self {
        let mut entries: HashMap<String, BTreeSet<usize>> = HashMap::new();
        for (position, record) in records.iter().enumerate() {
            if let Some(key) = title_key(&record.title) {
                entries.entry(key).or_default().insert(position);
            }
        }
        Self {
            entries,
            record_count: records.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn positions(&self, key: &str) -> Option<&BTreeSet<usize>> {
        self.entries.get(key)
    }

    /// Find the records a row belongs to, trying the "um"-stripped agent second
    pub fn resolve(&self, name: &str, active_agent: &str) -> Option<(MatchKind, &BTreeSet<usize>)> {
        self.lookup(name, active_agent)
            .map(|(kind, _, positions)| (kind, positions))
    }

    fn lookup(&self, name: &str, active_agent: &str) -> Option<(MatchKind, &str, &BTreeSet<usize>)> {
        let trimmed_name = leading_alnum(name).unwrap_or(name);

        if let Some((key, positions)) = self.entries.get_key_value(&compose_key(trimmed_name, active_agent)) {
            return Some((MatchKind::Primary, key.as_str(), positions));
        }

        let stem = active_agent.strip_suffix(LATIN_SUFFIX)?;
        self.entries
            .get_key_value(&compose_key(trimmed_name, stem))
            .map(|(key, positions)| (MatchKind::Stem, key.as_str(), positions))
    }

    /// Append the row's registration number to every record it resolves to.
    ///
    /// `Ok(None)` means the row matched nothing.
    pub fn patch_records(
        &self,
        records: &mut [SwissmedicRecord],
        row: &PackageRow,
        check: DuplicateCheck,
    ) -> Result<Option<MatchKind>, MatchError> {
        if records.len() != self.record_count {
            return Err(MatchError::StaleIndex {
                indexed: self.record_count,
                actual: records.len(),
            });
        }

        let Some((kind, key, positions)) = self.lookup(&row.name, &row.active_agent) else {
            return Ok(None);
        };
        if let Some(&position) = positions
            .iter()
            .find(|&&position| title_key(&records[position].title).as_deref() != Some(key))
        {
            return Err(MatchError::RetitledRecord {
                position,
                key: key.to_string(),
            });
        }
        for &position in positions {
            records[position].append_reg_number(row.reg_number, check);
        }
        Ok(Some(kind))
    }
}
