//! Application layer module
//!
//! One use case per pipeline; each wires infrastructure clients and parsers
//! to the domain reconciliation logic.

pub mod certificate_reconciler;
pub mod downloads;
pub mod drugshortage_pipeline;
pub mod migel_pipeline;
pub mod packages_enrichment;
pub mod swissmedic_pipeline;

pub use certificate_reconciler::{CertificateReconciler, ReconcileError, ReconcileReport, Reconciliation};
pub use drugshortage_pipeline::DrugshortagePipeline;
pub use migel_pipeline::{MigelPipeline, MigelReport};
pub use packages_enrichment::{apply_custom_mapping, enrich_swissmedic_records, EnrichmentReport};
pub use swissmedic_pipeline::{Enrichment, SwissmedicPipeline, SwissmedicSource};
