//! Supplementary protection certificates (ESZ) from the Swissreg registry
//!
//! Holds both the registry's wire documents and the reconciled output. The
//! wire types keep the registry's German field names; every field is optional
//! because the registry omits or nulls them freely.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Registration numbers kept for certificate lookups have exactly this many digits
pub const IKSNR_LEN: usize = 5;

/// Opaque continuation payload returned by the search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContinuationToken(pub String);

/// `POST query/search` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest<'a> {
    pub target: &'a str,
    pub search_string: &'a str,
    pub filters: serde_json::Map<String, serde_json::Value>,
    pub sort_by_field: &'a str,
    pub sort_order: &'a str,
    pub page_size: usize,
}

impl<'a> SearchRequest<'a> {
    /// Certificate search by free text, best score first
    pub fn esz(search_string: &'a str, page_size: usize) -> Self {
        Self {
            target: "esz",
            search_string,
            filters: serde_json::Map::new(),
            sort_by_field: "score",
            sort_order: "DESC",
            page_size,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub total_items: Option<u64>,
    #[serde(default)]
    pub page_size: Option<u64>,
    #[serde(default)]
    pub metadata_as_transit: Option<String>,
}

impl SearchResponse {
    /// Cursor for the next page; only a full page can have a successor
    pub fn next_cursor(&self, page_size: usize) -> Option<ContinuationToken> {
        if self.results.len() != page_size {
            return None;
        }
        self.metadata_as_transit.clone().map(ContinuationToken)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub id: Vec<String>,
}

impl SearchResult {
    pub fn certificate_id(&self) -> Option<&str> {
        self.id.first().map(String::as_str)
    }
}

/// Numeric or textual resource id as the registry happens to send it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasePatentRef {
    pub id: ResourceId,
    #[serde(default)]
    pub nummer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Approval {
    #[serde(default)]
    pub datum: Option<String>,
    #[serde(default)]
    pub nummer: Option<String>,
}

/// `GET ds/{id}` for a certificate
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateResource {
    #[serde(default)]
    pub schutztitelnummer: Option<String>,
    #[serde(default)]
    pub erteilungsdatum: Option<String>,
    #[serde(default)]
    pub publikationsdatum: Option<String>,
    #[serde(default)]
    pub eintragungsdatum: Option<String>,
    #[serde(default)]
    pub schutzdauerbeginn: Option<String>,
    #[serde(default)]
    pub maximale_schutzdauer: Option<String>,
    #[serde(default)]
    pub loeschdatum: Option<String>,
    #[serde(default)]
    pub grundpatent: Option<BasePatentRef>,
    #[serde(default)]
    pub zulassungen: Vec<Approval>,
}

/// `GET ds/urn:ige:schutztitel:patent:{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatentResource {
    #[serde(default)]
    pub schutztitelnummer: Option<String>,
    #[serde(default)]
    pub anmeldedatum: Option<String>,
}

/// Reconciled certificate as written to `swissreg.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    pub certificate_number: String,
    pub issue_date: String,
    pub publication_date: String,
    pub registration_date: String,
    pub protection_date: String,
    pub base_patent_date: String,
    pub base_patent: String,
    pub iksnrs: Vec<String>,
    pub expiry_date: String,
    pub deletion_date: String,
}

impl Certificate {
    /// Build the output record; missing fields become empty strings.
    pub fn from_resources(cert: CertificateResource, patent: Option<PatentResource>) -> Self {
        let mut iksnrs: Vec<String> = Vec::new();
        for nummer in cert.zulassungen.iter().filter_map(|z| z.nummer.as_deref()) {
            let prefix: String = nummer.chars().take(IKSNR_LEN).collect();
            if !iksnrs.contains(&prefix) {
                iksnrs.push(prefix);
            }
        }

        let patent = patent.unwrap_or_default();
        let base_patent = cert
            .grundpatent
            .and_then(|g| g.nummer)
            .or(patent.schutztitelnummer)
            .unwrap_or_default();

        Self {
            certificate_number: cert.schutztitelnummer.unwrap_or_default(),
            issue_date: cert.erteilungsdatum.unwrap_or_default(),
            publication_date: cert.publikationsdatum.unwrap_or_default(),
            registration_date: cert.eintragungsdatum.unwrap_or_default(),
            protection_date: cert.schutzdauerbeginn.unwrap_or_default(),
            base_patent_date: patent.anmeldedatum.unwrap_or_default(),
            base_patent,
            iksnrs,
            expiry_date: cert.maximale_schutzdauer.unwrap_or_default(),
            deletion_date: cert.loeschdatum.unwrap_or_default(),
        }
    }

    /// Returns `true` if the number was not yet associated
    pub fn add_iksnr(&mut self, iksnr: &str) -> bool {
        if self.iksnrs.iter().any(|n| n == iksnr) {
            return false;
        }
        self.iksnrs.push(iksnr.to_string());
        true
    }
}

/// Certificates keyed by registry id
pub type CertificateMap = BTreeMap<String, Certificate>;
