//! Domain module - records, keys and merge rules
//!
//! Everything in here is free of I/O. Scrapers and API clients in
//! `infrastructure` produce these types; the pipelines in `application`
//! reconcile them.

pub mod certificate;
pub mod drugshortage;
pub mod migel;
pub mod record;
pub mod record_index;

// Re-export commonly used items for convenience
pub use certificate::{Certificate, CertificateMap, ContinuationToken};
pub use record::{DuplicateCheck, PrepEntry, RegNumber, SwissmedicRecord, REG_NUMBER_PROP};
pub use record_index::{MatchError, MatchKind, PackageRow, RecordIndex};
