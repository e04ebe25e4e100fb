//! Parsing error types
//!
//! Detailed error types for HTML parsing operations with enough context
//! (selector, url) to find the page that changed.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Table '{selector}' not found")]
    TableNotFound { selector: String },

    #[error("URL resolution failed: {url} - {reason}")]
    UrlResolutionFailed { url: String, reason: String },
}

impl ParsingError {
    /// Create an invalid selector error
    pub fn invalid_selector(selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn table_not_found(selector: &str) -> Self {
        Self::TableNotFound {
            selector: selector.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
