//! Swissreg registry API client
//!
//! The search endpoint pages with an opaque transit payload: the first page
//! is a JSON search request, every following page is requested by posting the
//! previous response's `metadataAsTransit` back verbatim.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::domain::certificate::{CertificateResource, ContinuationToken, PatentResource, SearchRequest, SearchResponse};
use crate::infrastructure::config::HttpConfig;
use crate::infrastructure::http_client::{FetchError, HttpClient};

const IPI_VERSION_HEADER: &str = "x-ipi-version";
const IPI_VERSION: &str = "9.0.4";
const ACCEPT_VALUE: &str = "application/json, text/plain, */*";
const TRANSIT_CONTENT_TYPE: &str = "application/transit+json";
const PATENT_URN_PREFIX: &str = "urn:ige:schutztitel:patent:";

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Failed to decode registry response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode search request: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Where a search page request starts from
#[derive(Debug, Clone, Copy)]
pub enum PageRequest<'a> {
    First { query: &'a str },
    Next { token: &'a ContinuationToken },
}

/// Operations the certificate reconciler needs from the registry
#[async_trait]
pub trait CertificateRegistry: Send + Sync {
    /// One page of certificate search results
    async fn search_page(&self, request: PageRequest<'_>, page_size: usize) -> Result<SearchResponse, RegistryError>;

    /// Certificate document by registry id
    async fn read_certificate(&self, id: &str) -> Result<CertificateResource, RegistryError>;

    /// Base patent document by its numeric patent id
    async fn read_patent(&self, patent_id: &str) -> Result<PatentResource, RegistryError>;
}

/// HTTP implementation against `https://www.swissreg.ch/database/resources`
pub struct SwissregClient {
    http: HttpClient,
    base_url: String,
}

impl SwissregClient {
    pub fn new(base_url: &str, config: HttpConfig) -> Result<Self, RegistryError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(HeaderName::from_static(IPI_VERSION_HEADER), HeaderValue::from_static(IPI_VERSION));

        Ok(Self {
            http: HttpClient::with_default_headers(config, headers)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send_json<T: DeserializeOwned>(&self, url: &str, request: reqwest::RequestBuilder) -> Result<T, RegistryError> {
        let response = self.http.send(url, request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { url: url.to_string(), source })?;
        serde_json::from_slice(&bytes).map_err(|source| RegistryError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn read_resource<T: DeserializeOwned>(&self, id: &str) -> Result<T, RegistryError> {
        let url = self.url(&format!("ds/{id}"));
        debug!("Fetching resource: {}", url);
        let request = self.http.request(Method::GET, &url);
        self.send_json(&url, request).await
    }
}

#[async_trait]
impl CertificateRegistry for SwissregClient {
    async fn search_page(&self, request: PageRequest<'_>, page_size: usize) -> Result<SearchResponse, RegistryError> {
        match request {
            PageRequest::First { query } => {
                let url = self.url("query/search");
                let body = serde_json::to_vec(&SearchRequest::esz(query, page_size)).map_err(RegistryError::Encode)?;
                let builder = self
                    .http
                    .request(Method::POST, &url)
                    .header(CONTENT_TYPE, "application/json")
                    .body(body);
                self.send_json(&url, builder).await
            }
            PageRequest::Next { token } => {
                let url = self.url(&format!("query/fetch?ps={page_size}"));
                debug!("Fetching next search page: {}", url);
                let builder = self
                    .http
                    .request(Method::POST, &url)
                    .header(CONTENT_TYPE, TRANSIT_CONTENT_TYPE)
                    .body(token.0.clone());
                self.send_json(&url, builder).await
            }
        }
    }

    async fn read_certificate(&self, id: &str) -> Result<CertificateResource, RegistryError> {
        self.read_resource(id).await
    }

    async fn read_patent(&self, patent_id: &str) -> Result<PatentResource, RegistryError> {
        self.read_resource(&format!("{PATENT_URN_PREFIX}{patent_id}")).await
    }
}
