//! Extraction provider client.
//!
//! Speaks the provider's async analyze protocol: submit page bytes as
//! base64 under a model id, receive an operation URL, poll it until the
//! operation reaches a terminal status, and map the returned fields into
//! a [`RawFieldSet`]. No retries live here; a failed page fails the page.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

use docstitch_shared::{DocstitchError, ProviderConfig, RawFieldSet, Result};

/// User-Agent string for provider requests.
const USER_AGENT: &str = concat!("docstitch/", env!("CARGO_PKG_VERSION"));

/// Header carrying the provider API key.
const API_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeOperation {
    status: String,
    #[serde(default)]
    error: Option<OperationError>,
    #[serde(default)]
    analyze_result: Option<AnalyzeResult>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    documents: Vec<AnalyzedDocument>,
}

#[derive(Debug, Deserialize)]
struct AnalyzedDocument {
    #[serde(default)]
    fields: std::collections::BTreeMap<String, ExtractedField>,
}

#[derive(Debug, Deserialize)]
struct ExtractedField {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// ExtractionClient
// ---------------------------------------------------------------------------

/// Client for the external extraction provider. Cheap to clone; clones
/// share the underlying connection pool.
#[derive(Clone)]
pub struct ExtractionClient {
    config: ProviderConfig,
    client: Client,
}

impl ExtractionClient {
    /// Create a new client from runtime provider configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        Url::parse(&config.endpoint).map_err(|e| {
            DocstitchError::config(format!(
                "invalid provider endpoint '{}': {e}",
                config.endpoint
            ))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DocstitchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Analyze one page: submit, poll, and return the named field values.
    ///
    /// The whole call is bounded by the configured per-page deadline,
    /// submission through final poll. Any provider-side failure surfaces
    /// as a single extraction error carrying the upstream message.
    #[instrument(skip_all, fields(model_id = %model_id, bytes = bytes.len()))]
    pub async fn analyze(&self, bytes: &[u8], model_id: &str) -> Result<RawFieldSet> {
        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_secs);

        let operation_url = self.submit(bytes, model_id).await?;
        debug!(%operation_url, "analyze operation accepted");

        self.poll(&operation_url, deadline).await
    }

    /// Submit the page and return the operation URL to poll.
    async fn submit(&self, bytes: &[u8], model_id: &str) -> Result<String> {
        let url = format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.config.endpoint, model_id, self.config.api_version
        );

        let body = serde_json::json!({
            "base64Source": BASE64.encode(bytes),
        });

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| DocstitchError::Network(format!("analyze submit: {e}")))?;

        let status = response.status();
        if status != StatusCode::ACCEPTED {
            let message = upstream_message(response).await;
            return Err(DocstitchError::extraction(format!(
                "submit rejected with HTTP {status}: {message}"
            )));
        }

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| {
                DocstitchError::extraction("provider accepted the page but sent no operation URL")
            })
    }

    /// Poll the operation until a terminal status or the deadline.
    async fn poll(&self, operation_url: &str, deadline: Instant) -> Result<RawFieldSet> {
        loop {
            let response = self
                .client
                .get(operation_url)
                .header(API_KEY_HEADER, &self.config.api_key)
                .send()
                .await
                .map_err(|e| DocstitchError::Network(format!("operation poll: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                let message = upstream_message(response).await;
                return Err(DocstitchError::extraction(format!(
                    "operation poll returned HTTP {status}: {message}"
                )));
            }

            let operation: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| DocstitchError::extraction(format!("malformed operation body: {e}")))?;

            match operation.status.as_str() {
                "succeeded" => return Ok(collect_fields(operation.analyze_result)),
                "failed" => {
                    let message = operation
                        .error
                        .map(|e| e.message)
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| "provider reported failure without detail".into());
                    return Err(DocstitchError::extraction(message));
                }
                other => {
                    debug!(status = other, "operation still pending");
                }
            }

            if Instant::now() >= deadline {
                warn!(%operation_url, "gave up polling analyze operation");
                return Err(DocstitchError::extraction(
                    "analyze operation did not complete within the deadline",
                ));
            }

            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
        }
    }
}

/// Flatten the operation result into provider-name → optional-content.
///
/// Later documents overwrite earlier ones for a repeated field name,
/// matching the provider's own reading order.
fn collect_fields(result: Option<AnalyzeResult>) -> RawFieldSet {
    let mut fields = RawFieldSet::new();
    if let Some(result) = result {
        for document in result.documents {
            for (name, field) in document.fields {
                fields.insert(name, field.content);
            }
        }
    }
    fields
}

/// Pull a single message string out of an error response body.
async fn upstream_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    // Prefer the provider's structured error message when present.
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(&body) {
        if let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }
    if body.is_empty() {
        "no response body".into()
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: "test-key".into(),
            api_version: "2024-02-29-preview".into(),
            poll_interval_ms: 10,
            timeout_secs: 5,
        }
    }

    fn succeeded_body() -> serde_json::Value {
        serde_json::json!({
            "status": "succeeded",
            "analyzeResult": {
                "documents": [{
                    "fields": {
                        "invoice number": { "content": "RE-2024-001" },
                        "costumer number": { "content": "K-778" },
                        "total amount": {}
                    }
                }]
            }
        })
    }

    #[tokio::test]
    async fn analyze_submits_polls_and_maps_fields() {
        let server = MockServer::start().await;
        let operation_url = format!("{}/operations/op-1", server.uri());

        Mock::given(method("POST"))
            .and(path("/documentintelligence/documentModels/final:analyze"))
            .and(query_param("api-version", "2024-02-29-preview"))
            .and(header(API_KEY_HEADER, "test-key"))
            .and(body_partial_json(serde_json::json!({
                "base64Source": BASE64.encode(b"page bytes"),
            })))
            .respond_with(
                ResponseTemplate::new(202).insert_header("operation-location", operation_url.as_str()),
            )
            .mount(&server)
            .await;

        // First poll still running, second succeeded.
        Mock::given(method("GET"))
            .and(path("/operations/op-1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "status": "running" })),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/op-1"))
            .and(header(API_KEY_HEADER, "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(succeeded_body()))
            .mount(&server)
            .await;

        let client = ExtractionClient::new(test_config(&server.uri())).unwrap();
        let fields = client.analyze(b"page bytes", "final").await.unwrap();

        assert_eq!(
            fields.get("invoice number"),
            Some(&Some("RE-2024-001".to_string()))
        );
        assert_eq!(fields.get("costumer number"), Some(&Some("K-778".to_string())));
        // Present field with no content stays present, valueless.
        assert_eq!(fields.get("total amount"), Some(&None));
    }

    #[tokio::test]
    async fn provider_failure_surfaces_upstream_message() {
        let server = MockServer::start().await;
        let operation_url = format!("{}/operations/op-2", server.uri());

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(202).insert_header("operation-location", operation_url.as_str()),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/operations/op-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "failed",
                "error": { "message": "page is not a readable document" }
            })))
            .mount(&server)
            .await;

        let client = ExtractionClient::new(test_config(&server.uri())).unwrap();
        let err = client.analyze(b"junk", "final").await.unwrap_err();

        assert!(matches!(err, DocstitchError::Extraction { .. }));
        assert!(err.to_string().contains("page is not a readable document"));
    }

    #[tokio::test]
    async fn rejected_submit_is_an_extraction_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "error": { "message": "invalid subscription key" }
            })))
            .mount(&server)
            .await;

        let client = ExtractionClient::new(test_config(&server.uri())).unwrap();
        let err = client.analyze(b"page", "final").await.unwrap_err();

        assert!(matches!(err, DocstitchError::Extraction { .. }));
        assert!(err.to_string().contains("invalid subscription key"));
    }

    #[tokio::test]
    async fn missing_operation_url_is_an_extraction_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(202))
            .mount(&server)
            .await;

        let client = ExtractionClient::new(test_config(&server.uri())).unwrap();
        let err = client.analyze(b"page", "final").await.unwrap_err();

        assert!(err.to_string().contains("no operation URL"));
    }
}
