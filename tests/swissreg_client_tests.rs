//! Swissreg client wire format against a mock registry
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use swiss_pharma_scrape::domain::ContinuationToken;
use swiss_pharma_scrape::infrastructure::config::HttpConfig;
use swiss_pharma_scrape::infrastructure::http_client::FetchError;
use swiss_pharma_scrape::infrastructure::swissreg_client::{CertificateRegistry, PageRequest, RegistryError, SwissregClient};

fn http_config() -> HttpConfig {
    HttpConfig {
        max_requests_per_second: 1000,
        ..HttpConfig::default()
    }
}

#[tokio::test]
async fn first_page_posts_search_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query/search"))
        .and(header("x-ipi-version", "9.0.4"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "target": "esz",
            "searchString": "58271",
            "filters": {},
            "sortByField": "score",
            "sortOrder": "DESC",
            "pageSize": 64
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": ["urn:ige:schutztitel:esz:1"] }],
            "totalItems": 1,
            "pageSize": 64,
            "metadataAsTransit": "[\"^ \",\"~:page\",1]"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SwissregClient::new(&server.uri(), http_config()).unwrap();
    let response = client
        .search_page(PageRequest::First { query: "58271" }, 64)
        .await
        .unwrap();

    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].certificate_id(), Some("urn:ige:schutztitel:esz:1"));
    assert_eq!(response.next_cursor(64), None);
}

#[tokio::test]
async fn next_page_posts_transit_token_verbatim() {
    let server = MockServer::start().await;
    let token = ContinuationToken("[\"^ \",\"~:page\",2]".to_string());
    Mock::given(method("POST"))
        .and(path("/query/fetch"))
        .and(query_param("ps", "2"))
        .and(header("content-type", "application/transit+json"))
        .and(body_string(token.0.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "id": ["a"] }, { "id": ["b"] }],
            "metadataAsTransit": "next"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = SwissregClient::new(&server.uri(), http_config()).unwrap();
    let response = client
        .search_page(PageRequest::Next { token: &token }, 2)
        .await
        .unwrap();

    assert_eq!(response.next_cursor(2), Some(ContinuationToken("next".to_string())));
}

#[tokio::test]
async fn reads_certificate_and_patent_resources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ds/urn:ige:schutztitel:esz:1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schutztitelnummer": "C00644840/01",
            "grundpatent": { "id": 644840, "nummer": "CH644840" },
            "zulassungen": [{ "datum": "28.05.2009", "nummer": "58271001" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ds/urn:ige:schutztitel:patent:644840"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schutztitelnummer": "EP1427815",
            "anmeldedatum": "11.09.2002"
        })))
        .mount(&server)
        .await;

    let client = SwissregClient::new(&server.uri(), http_config()).unwrap();
    let cert = client.read_certificate("urn:ige:schutztitel:esz:1").await.unwrap();
    let patent_id = cert.grundpatent.as_ref().unwrap().id.to_string();
    let patent = client.read_patent(&patent_id).await.unwrap();

    assert_eq!(cert.schutztitelnummer.as_deref(), Some("C00644840/01"));
    assert_eq!(patent.anmeldedatum.as_deref(), Some("11.09.2002"));
}

#[tokio::test]
async fn error_status_and_bad_json_are_typed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ds/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ds/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let client = SwissregClient::new(&server.uri(), http_config()).unwrap();

    let missing = client.read_certificate("missing").await.unwrap_err();
    assert!(matches!(missing, RegistryError::Fetch(FetchError::Status { status: 404, .. })));

    let garbled = client.read_certificate("garbled").await.unwrap_err();
    assert!(matches!(garbled, RegistryError::Decode { .. }));
}
