//! Patent-certificate reconciliation against the Swissreg registry
//!
//! Every five-digit Swissmedic registration number is searched in the
//! supplementary protection certificate (ESZ) register. Certificates are
//! resolved once and carry every registration number that found them in
//! `iksnrs`, next to the prefixes of their own `zulassungen`.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::domain::certificate::SearchResult;
use crate::domain::{Certificate, CertificateMap};
use crate::infrastructure::config::{FailurePolicy, ReconcileConfig};
use crate::infrastructure::output::write_json;
use crate::infrastructure::spreadsheet;
use crate::infrastructure::swissreg_client::{CertificateRegistry, PageRequest, RegistryError};

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("Reconciliation aborted at registration number {reg_number}: {source}")]
    Aborted {
        reg_number: String,
        #[source]
        source: RegistryError,
        /// Certificates collected before the failure
        partial: CertificateMap,
    },
}

/// Result of a completed reconciliation pass
#[derive(Debug, Default)]
pub struct Reconciliation {
    pub certificates: CertificateMap,
    /// Registration numbers skipped after an error
    pub failed: Vec<String>,
    pub searched: usize,
}

/// Summary of a reconciliation run as written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub searched: usize,
    pub certificates: usize,
    pub failed: Vec<String>,
}

pub struct CertificateReconciler<R> {
    registry: R,
    page_size: usize,
    failure_policy: FailurePolicy,
}

impl<R: CertificateRegistry> CertificateReconciler<R> {
    pub fn new(registry: R, config: &ReconcileConfig) -> Self {
        Self {
            registry,
            page_size: config.search_page_size,
            failure_policy: config.failure_policy,
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// All search results for `query`, following the continuation cursor
    /// while pages come back full.
    pub async fn search_all(&self, query: &str) -> Result<Vec<SearchResult>, RegistryError> {
        debug!("Searching ESZ: {}", query);
        let mut response = self
            .registry
            .search_page(PageRequest::First { query }, self.page_size)
            .await?;
        let mut results = Vec::new();

        loop {
            let cursor = response.next_cursor(self.page_size);
            results.append(&mut response.results);
            let Some(token) = cursor else { break };
            response = self
                .registry
                .search_page(PageRequest::Next { token: &token }, self.page_size)
                .await?;
        }

        debug!("Result count for {}: {}", query, results.len());
        Ok(results)
    }

    async fn resolve_certificate(&self, id: &str) -> Result<Certificate, RegistryError> {
        let resource = self.registry.read_certificate(id).await?;
        let patent = match resource.grundpatent.as_ref() {
            Some(base) => Some(self.registry.read_patent(&base.id.to_string()).await?),
            None => {
                debug!("Certificate {} has no base patent", id);
                None
            }
        };
        Ok(Certificate::from_resources(resource, patent))
    }

    /// Search one registration number and merge its hits into `certificates`
    async fn reconcile_number(&self, reg_number: &str, certificates: &mut CertificateMap) -> Result<(), RegistryError> {
        for result in self.search_all(reg_number).await? {
            let Some(id) = result.certificate_id() else {
                continue;
            };
            match certificates.get_mut(id) {
                Some(existing) => {
                    if existing.add_iksnr(reg_number) {
                        debug!("Added {} to certificate {}", reg_number, id);
                    }
                }
                None => {
                    let mut certificate = self.resolve_certificate(id).await?;
                    certificate.add_iksnr(reg_number);
                    certificates.insert(id.to_string(), certificate);
                }
            }
        }
        Ok(())
    }

    /// Reconcile every number in order, applying the failure policy
    pub async fn reconcile<'a, I>(&self, reg_numbers: I) -> Result<Reconciliation, ReconcileError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut outcome = Reconciliation::default();

        for reg_number in reg_numbers {
            outcome.searched += 1;
            if let Err(e) = self.reconcile_number(reg_number, &mut outcome.certificates).await {
                match self.failure_policy {
                    FailurePolicy::SkipItem => {
                        error!("Failed to reconcile registration number {}: {}", reg_number, e);
                        outcome.failed.push(reg_number.clone());
                    }
                    FailurePolicy::Abort => {
                        return Err(ReconcileError::Aborted {
                            reg_number: reg_number.clone(),
                            source: e,
                            partial: outcome.certificates,
                        });
                    }
                }
            }
        }
        Ok(outcome)
    }

    /// Reconcile and write the certificate map to `output`.
    ///
    /// On abort the partial map is written before the error is returned.
    pub async fn run(&self, reg_numbers: &BTreeSet<String>, output: &Path) -> Result<ReconcileReport> {
        info!("Number of Swissmedic registration numbers: {}", reg_numbers.len());

        match self.reconcile(reg_numbers).await {
            Ok(outcome) => {
                write_json(output, &outcome.certificates).await?;
                info!("Wrote {} certificates to {}", outcome.certificates.len(), output.display());
                if !outcome.failed.is_empty() {
                    warn!("{} registration numbers failed: {}", outcome.failed.len(), outcome.failed.join(","));
                }
                Ok(ReconcileReport {
                    searched: outcome.searched,
                    certificates: outcome.certificates.len(),
                    failed: outcome.failed,
                })
            }
            Err(ReconcileError::Aborted {
                reg_number,
                source,
                partial,
            }) => {
                write_json(output, &partial)
                    .await
                    .context("Failed to write partial certificate output")?;
                warn!("Wrote {} certificates before aborting", partial.len());
                Err(anyhow::Error::new(source).context(format!("Reconciliation aborted at registration number {reg_number}")))
            }
        }
    }
}

/// Five-digit registration numbers of the packages spreadsheet, ascending
pub fn load_reg_numbers(packages_xlsx: &Path) -> Result<BTreeSet<String>> {
    let range = spreadsheet::first_worksheet(packages_xlsx)?;
    Ok(spreadsheet::five_digit_reg_numbers(&range))
}
