//! Ingestion submitter - responsibility and behavior
//!
//! The submitter takes the in-memory record batch and performs the single
//! authenticated upload to an Azure Monitor Data Collection Endpoint. The
//! Data Collection Rule id and stream name select the destination table on
//! the service side; the probe itself only addresses them.
//!
//! Key responsibilities:
//! - Build the upload URL from endpoint, rule id and stream name.
//! - Acquire a bearer token through the configured `TokenCredential`.
//! - POST the JSON record array and interpret the response: any 2xx is an
//! acknowledgment (the service answers 204 No Content), a non-2xx is a
//! structured API error carrying the service's error code and message.
//!
//! Important design notes:
//! - One call, one batch. Retry, backoff and buffering are deliberately
//! absent; the probe exists to answer "is this pipeline wired correctly",
//! not to deliver data reliably.
//! - `LogsUpload` is the seam the runtime drives, so tests can substitute a
//! fake submitter and never open a socket.

// Local crates
use crate::credentials::credentials::{CredentialError, MONITOR_SCOPE, TokenCredential};
use crate::ingestion::models::LogRecord;

// External crates
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;
use url::Url;

/// Ingestion API version the upload is pinned to.
pub const API_VERSION: &str = "2023-01-01";

/// Submitter error handling
/// - `Api` and a rejected credential exchange are the "structured" failures
/// the reporter pairs with a remediation checklist; everything else is
/// reported generically.
#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("ingestion API error (HTTP {status}): {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },
    #[error("upload failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid DCE endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
}

impl IngestionError {
    /// True when the service (or identity provider) answered with a
    /// structured rejection, i.e. the request arrived but was refused.
    pub fn is_api_rejection(&self) -> bool {
        matches!(
            self,
            IngestionError::Api { .. }
                | IngestionError::Credential(CredentialError::Rejected { .. })
        )
    }
}

/// Capability interface for submitting one record batch.
#[async_trait]
pub trait LogsUpload: Send + Sync {
    async fn upload(
        &self,
        rule_id: &str,
        stream_name: &str,
        logs: &[LogRecord],
    ) -> Result<(), IngestionError>;
}

/// HTTP client bound to one Data Collection Endpoint.
pub struct LogsIngestionClient {
    endpoint: String,
    credential: Arc<dyn TokenCredential>,
    http: reqwest::Client,
}

impl fmt::Debug for LogsIngestionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogsIngestionClient({})", self.endpoint)
    }
}

// Error shape returned by the ingestion service on non-2xx responses.
#[derive(Debug, Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize, Default)]
struct ApiErrorDetail {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

impl LogsIngestionClient {
    /// Bind a client to a Data Collection Endpoint.
    ///
    /// The endpoint is not validated here; a malformed URL surfaces as an
    /// `InvalidEndpoint` error when the upload is attempted, mirroring the
    /// "errors appear at the network call" contract of the probe.
    pub fn new(endpoint: &str, credential: Arc<dyn TokenCredential>) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credential,
            http: reqwest::Client::new(),
        }
    }

    fn upload_url(&self, rule_id: &str, stream_name: &str) -> Result<Url, IngestionError> {
        let raw = format!(
            "{}/dataCollectionRules/{}/streams/{}?api-version={}",
            self.endpoint, rule_id, stream_name, API_VERSION
        );
        Url::parse(&raw).map_err(|source| IngestionError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            source,
        })
    }
}

#[async_trait]
impl LogsUpload for LogsIngestionClient {
    #[instrument(
        name = "logs_upload",
        target = "ingestion::client",
        level = "debug",
        skip(self, logs)
    )]
    async fn upload(
        &self,
        rule_id: &str,
        stream_name: &str,
        logs: &[LogRecord],
    ) -> Result<(), IngestionError> {
        let url = self.upload_url(rule_id, stream_name)?;
        let token = self.credential.get_token(MONITOR_SCOPE).await?;

        tracing::debug!(url = %url, records = logs.len(), "Uploading record batch");
        let response = self
            .http
            .post(url)
            .bearer_auth(&token.token)
            .json(logs)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: ApiErrorBody = response.json().await.unwrap_or_default();
            tracing::debug!(status = %status, code = %body.error.code, "Upload rejected");
            return Err(IngestionError::Api {
                status: status.as_u16(),
                code: body.error.code,
                message: body.error.message,
            });
        }

        // 204 No Content with an empty body is the success acknowledgment.
        tracing::debug!(status = %status, "Upload acknowledged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::credentials::AccessToken;

    struct RejectedCredential;

    #[async_trait]
    impl TokenCredential for RejectedCredential {
        async fn get_token(&self, _scope: &str) -> Result<AccessToken, CredentialError> {
            Err(CredentialError::Rejected {
                status: 401,
                code: "invalid_client".to_string(),
                description: "AADSTS7000215: Invalid client secret provided.".to_string(),
            })
        }
    }

    fn client_with(endpoint: &str) -> LogsIngestionClient {
        LogsIngestionClient::new(endpoint, Arc::new(RejectedCredential))
    }

    #[test]
    fn upload_url_is_rule_and_stream_addressed() {
        let client = client_with("https://my-dce-abcd.eastus-1.ingest.monitor.azure.com");
        let url = client.upload_url("dcr-0123", "Custom-TestData_CL").unwrap();

        assert_eq!(
            url.as_str(),
            "https://my-dce-abcd.eastus-1.ingest.monitor.azure.com/dataCollectionRules/dcr-0123/streams/Custom-TestData_CL?api-version=2023-01-01"
        );
    }

    #[test]
    fn trailing_slash_on_the_endpoint_is_tolerated() {
        let client = client_with("https://dce.example/");
        let url = client.upload_url("dcr-1", "S").unwrap();
        assert!(url.as_str().starts_with("https://dce.example/dataCollectionRules/"));
    }

    #[test]
    fn malformed_endpoint_surfaces_at_upload_time() {
        let client = client_with("not a url");
        let err = client.upload_url("dcr-1", "S").unwrap_err();
        assert!(matches!(err, IngestionError::InvalidEndpoint { .. }));
        assert!(!err.is_api_rejection());
    }

    #[tokio::test]
    async fn rejected_credential_stops_the_upload_before_any_send() {
        let client = client_with("https://dce.example");
        let err = client
            .upload("dcr-1", "Custom-TestData_CL", &[])
            .await
            .unwrap_err();

        assert!(err.is_api_rejection());
        assert!(err.to_string().contains("invalid_client"));
    }

    #[test]
    fn api_errors_are_structured_rejections() {
        let err = IngestionError::Api {
            status: 403,
            code: "OperationFailed".to_string(),
            message: "The authentication token is not authorized.".to_string(),
        };
        assert!(err.is_api_rejection());
    }
}
