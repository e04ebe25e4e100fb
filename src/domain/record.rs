//! Swissmedic publication records and the registration-number merge rule
//!
//! A record is what the list/detail scraper produces for one recall or
//! health-professional communication. Its `prep` table is an ordered list of
//! label/value pairs copied verbatim from the detail page, so the same label
//! may appear more than once.

use serde::{Deserialize, Serialize};

/// Label of the `prep` entry holding the comma-joined registration numbers
pub const REG_NUMBER_PROP: &str = "Zulassungsnummer";

/// Swissmedic registration number (Zulassungsnummer)
pub type RegNumber = u64;

/// One row of the preparation table on a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepEntry {
    pub prop: String,
    pub field: String,
}

impl PrepEntry {
    pub fn new(prop: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            prop: prop.into(),
            field: field.into(),
        }
    }
}

/// Merged list + detail record for a Swissmedic publication
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwissmedicRecord {
    pub url: Option<String>,
    pub title: String,
    /// `dd/mm/yyyy` as shown on the list page
    pub date: String,
    /// `yyyy/mm/dd`, sortable
    pub date_order: String,
    #[serde(default)]
    pub date_doc: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub pdf: Option<String>,
    #[serde(default)]
    pub prep: Vec<PrepEntry>,
}

impl SwissmedicRecord {
    /// Record with only a title, mostly useful for tests and custom mappings
    pub fn with_title(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Current registration-number value, if the record carries one
    pub fn reg_numbers(&self) -> Option<&str> {
        self.prep
            .iter()
            .find(|p| p.prop == REG_NUMBER_PROP)
            .map(|p| p.field.as_str())
    }

    /// Append `reg_number` to the `Zulassungsnummer` entry, creating it when absent.
    ///
    /// Returns `true` when the value changed.
    pub fn append_reg_number(&mut self, reg_number: RegNumber, check: DuplicateCheck) -> bool {
        self.append_reg_number_text(&reg_number.to_string(), check)
    }

    /// Same as [`SwissmedicRecord::append_reg_number`] for a number kept as written,
    /// leading zeros included
    pub fn append_reg_number_text(&mut self, number: &str, check: DuplicateCheck) -> bool {
        match self.prep.iter_mut().find(|p| p.prop == REG_NUMBER_PROP) {
            Some(entry) => {
                if check.contains(&entry.field, number) {
                    return false;
                }
                entry.field.push(',');
                entry.field.push_str(number);
                true
            }
            None => {
                self.prep.push(PrepEntry::new(REG_NUMBER_PROP, number));
                true
            }
        }
    }
}

/// How an existing comma-joined value is searched for a number before appending
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateCheck {
    /// Compare against each comma-separated entry
    #[default]
    Exact,
    /// Plain substring containment; `"123"` already "contains" `23`
    Substring,
}

impl DuplicateCheck {
    pub fn contains(self, joined: &str, number: &str) -> bool {
        match self {
            Self::Exact => joined.split(',').any(|n| n.trim() == number),
            Self::Substring => joined.contains(number),
        }
    }
}
