//! HTML parsing for the scraped sites
//!
//! Pages are parsed with `scraper`. Each site gets its own parser module; the
//! shared table walking lives in [`table`].

pub mod drugshortage_parser;
pub mod error;
pub mod migel_parser;
pub mod swissmedic_parser;
pub mod table;

// Re-export public types
pub use error::{ParsingError, ParsingResult};
pub use table::TableExtractor;

use scraper::{ElementRef, Selector};
use url::Url;

/// Compile a CSS selector, mapping the error into [`ParsingError`]
pub fn selector(css: &str) -> ParsingResult<Selector> {
    Selector::parse(css).map_err(|e| ParsingError::invalid_selector(css, e))
}

/// Concatenated text content of an element
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Text of the first match of `selector` below `element`, empty when absent
pub fn first_text(element: &ElementRef<'_>, selector: &Selector) -> String {
    element.select(selector).next().map(|e| element_text(&e)).unwrap_or_default()
}

/// Resolve `href` against the page URL
pub fn absolute_url(base: &str, href: &str) -> ParsingResult<String> {
    let base = Url::parse(base).map_err(|e| ParsingError::UrlResolutionFailed {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    base.join(href)
        .map(String::from)
        .map_err(|e| ParsingError::UrlResolutionFailed {
            url: href.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_links() {
        let url = absolute_url("https://www.swissmedic.ch/swissmedic/de/home/a/b.html", "/dam/doc.pdf").unwrap();
        assert_eq!(url, "https://www.swissmedic.ch/dam/doc.pdf");
    }

    #[test]
    fn invalid_selector_is_reported() {
        assert!(matches!(selector("td:::"), Err(ParsingError::InvalidSelector { .. })));
    }
}
