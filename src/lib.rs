//! Swiss Pharma Scrape - batch scrapers for Swiss drug registry data
//!
//! Scrapes drugshortage.ch, Swissmedic publications, the MiGeL list and the
//! Swissreg certificate register, and reconciles records across these
//! sources by registration number.

// Module declarations
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

pub use cli::{run, Cli};
