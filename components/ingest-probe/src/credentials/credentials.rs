//! Credential acquirer - responsibility and behavior
//!
//! Wraps the OAuth2 client-credential exchange against the Microsoft Entra ID
//! token endpoint. Callers hand it a tenant id, client id and client secret
//! and get back bearer tokens scoped for the Azure Monitor ingestion service.
//!
//! Key responsibilities:
//! - Build the tenant-specific token endpoint URL.
//! - POST the form-encoded `client_credentials` grant and parse the response.
//! - Surface a structured error when the identity provider rejects the
//! exchange (bad secret, unknown tenant, unknown app), and a transport error
//! for everything else.
//!
//! Important design notes:
//! - Constructing a `ClientSecretCredential` performs no I/O; the token is
//! fetched lazily on the first `get_token` call, so a bad secret only shows
//! up once the submission pipeline actually runs.
//! - The `TokenCredential` trait is the seam that lets the pipeline run
//! against a fake during tests instead of a live identity provider.

// External crates
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use tracing::instrument;

/// Default Entra ID authority used to mint tokens.
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// OAuth2 scope covering the Azure Monitor ingestion API.
pub const MONITOR_SCOPE: &str = "https://monitor.azure.com/.default";

/// Bearer token handed back by the identity provider.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    /// Seconds until expiry; informational only for a one-shot run.
    pub expires_in: u64,
}

/// Credential error handling
/// - Clearly defines domain errors; `Rejected` carries the identity
/// provider's own error code and description so the reporter can echo them.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("token endpoint rejected the exchange (HTTP {status}): {code}: {description}")]
    Rejected {
        status: u16,
        code: String,
        description: String,
    },
    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Capability interface for acquiring bearer tokens, so the submission
/// pipeline never depends on a live identity provider in tests.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError>;
}

/// Client-credential flow against Entra ID for a registered application.
pub struct ClientSecretCredential {
    tenant_id: String,
    client_id: String,
    client_secret: String,
    authority_host: String,
    http: reqwest::Client,
}

impl fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The secret never reaches logs or panic messages.
        f.debug_struct("ClientSecretCredential")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("authority_host", &self.authority_host)
            .finish()
    }
}

impl ClientSecretCredential {
    pub fn new(tenant_id: &str, client_id: &str, client_secret: &str) -> Self {
        Self::with_authority_host(tenant_id, client_id, client_secret, DEFAULT_AUTHORITY_HOST)
    }

    /// Point the exchange at a non-default authority (sovereign clouds, or a
    /// local stand-in during tests).
    pub fn with_authority_host(
        tenant_id: &str,
        client_id: &str,
        client_secret: &str,
        authority_host: &str,
    ) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            authority_host: authority_host.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.tenant_id
        )
    }

    fn form_params<'a>(&'a self, scope: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("grant_type", "client_credentials"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("scope", scope),
        ]
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

// Error shape returned by the Entra ID token endpoint.
#[derive(Debug, Deserialize, Default)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    #[instrument(
        name = "credential_exchange",
        target = "credentials::credentials",
        level = "debug",
        skip_all
    )]
    async fn get_token(&self, scope: &str) -> Result<AccessToken, CredentialError> {
        let url = self.token_url();
        tracing::debug!(token_url = %url, client_id = %self.client_id, "Requesting bearer token");

        let response = self
            .http
            .post(&url)
            .form(&self.form_params(scope))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body: TokenErrorResponse = response.json().await.unwrap_or_default();
            tracing::debug!(status = %status, code = %body.error, "Token exchange rejected");
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                code: body.error,
                description: body.error_description,
            });
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!(expires_in = token.expires_in, "Bearer token acquired");
        Ok(AccessToken {
            token: token.access_token,
            expires_in: token.expires_in,
        })
    }
}
