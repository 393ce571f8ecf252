//! Probe runtime - the linear verification pipeline.
//!
//! Drives the whole run: load configuration, gate on the presence check,
//! build the credential and the ingestion client, submit the fixed sample
//! batch once, and classify any failure into one of the three terminal
//! tiers. No retries, no re-entry; the single batch either fully succeeds
//! or the run fails.

// Local crates
use crate::credentials::credentials::ClientSecretCredential;
use crate::helpers::load_config::Config;
use crate::ingestion::client::{IngestionError, LogsIngestionClient, LogsUpload};
use crate::ingestion::models::{LogRecord, sample_batch};
use crate::reporter::reporter;

// External crates
use anyhow::Result;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

/// Probe error handling
/// - The three variants are exactly the three reporting tiers: incomplete
/// configuration, a structured API rejection, and everything else.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("configuration incomplete: {0:?}")]
    IncompleteConfig(Vec<&'static str>),
    #[error(transparent)]
    Ingestion(#[from] IngestionError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Submit one batch through any uploader and report how many records it
/// carried. The count is what the success banner echoes.
pub async fn submit_batch<U: LogsUpload + ?Sized>(
    uploader: &U,
    rule_id: &str,
    stream_name: &str,
    records: &[LogRecord],
) -> Result<usize, IngestionError> {
    uploader.upload(rule_id, stream_name, records).await?;
    Ok(records.len())
}

/// Run the full verification pipeline against the live service.
///
/// State machine: Start -> Validated -> Authenticated -> Submitted ->
/// {Succeeded | Failed}. All printing happens here and in the reporter; the
/// caller only maps the returned error onto an exit code.
#[instrument(
    name = "probe_run",
    target = "runtime::runtime",
    level = "debug",
    skip_all
)]
pub async fn run_probe(config_path: PathBuf) -> Result<(), ProbeError> {
    let cfg = Config::load(&config_path)?;

    let missing = cfg.missing_fields();
    if !missing.is_empty() {
        return Err(ProbeError::IncompleteConfig(missing));
    }
    info!(config_file = %config_path.display(), "Configuration validated");

    let records = sample_batch(Utc::now());

    reporter::print_banner();
    reporter::print_config(&cfg, records.len());
    reporter::print_payload(&records)?;

    reporter::step("Authenticating with Microsoft Entra ID...");
    let credential = Arc::new(ClientSecretCredential::new(
        &cfg.identity.tenant_id,
        &cfg.identity.client_id,
        &cfg.identity.client_secret,
    ));
    reporter::step_ok("Credential configured");

    reporter::step("Creating ingestion client...");
    let client = LogsIngestionClient::new(&cfg.ingestion.dce_endpoint, credential);
    reporter::step_ok("Client created");

    reporter::step(&format!("Sending {} records...", records.len()));
    let sent = submit_batch(
        &client,
        &cfg.ingestion.dcr_id,
        &cfg.ingestion.stream_name,
        &records,
    )
    .await?;

    reporter::print_success(sent, &cfg.ingestion.stream_name);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::io::Write;
    use std::sync::Mutex;

    /// Fake submitter recording what it was asked to ship.
    struct RecordingUploader {
        calls: Mutex<Vec<(String, String, usize)>>,
        fail_with: Option<fn() -> IngestionError>,
    }

    impl RecordingUploader {
        fn succeeding() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: None,
            }
        }

        fn failing(make: fn() -> IngestionError) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_with: Some(make),
            }
        }
    }

    #[async_trait]
    impl LogsUpload for RecordingUploader {
        async fn upload(
            &self,
            rule_id: &str,
            stream_name: &str,
            logs: &[LogRecord],
        ) -> Result<(), IngestionError> {
            self.calls.lock().unwrap().push((
                rule_id.to_string(),
                stream_name.to_string(),
                logs.len(),
            ));
            match self.fail_with {
                Some(make) => Err(make()),
                None => Ok(()),
            }
        }
    }

    #[tokio::test]
    async fn successful_submission_reports_the_record_count() {
        let uploader = RecordingUploader::succeeding();
        let records = sample_batch(Utc::now());

        let sent = submit_batch(&uploader, "dcr-1", "Custom-TestData_CL", &records)
            .await
            .unwrap();

        assert_eq!(sent, 2);
        assert_eq!(
            uploader.calls.lock().unwrap().as_slice(),
            &[("dcr-1".to_string(), "Custom-TestData_CL".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn structured_api_errors_pass_through_unchanged() {
        let uploader = RecordingUploader::failing(|| IngestionError::Api {
            status: 403,
            code: "OperationFailed".to_string(),
            message: "The authentication token is not authorized.".to_string(),
        });
        let records = sample_batch(Utc::now());

        let err = submit_batch(&uploader, "dcr-1", "Custom-TestData_CL", &records)
            .await
            .unwrap_err();

        assert!(err.is_api_rejection());
        assert!(err.to_string().contains("OperationFailed"));
    }

    #[tokio::test]
    async fn incomplete_configuration_stops_the_run_before_any_network_setup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[identity]
tenant_id = "t"
client_id = "c"
client_secret = ""

[ingestion]
dce_endpoint = "https://dce.example"
dcr_id = "dcr-1"
stream_name = "Custom-TestData_CL"
"#,
        )
        .unwrap();

        let err = run_probe(file.path().to_path_buf()).await.unwrap_err();

        match err {
            ProbeError::IncompleteConfig(missing) => {
                assert_eq!(missing, vec!["identity.client_secret"]);
            }
            other => panic!("expected IncompleteConfig, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_configuration_is_a_generic_failure() {
        let err = run_probe(PathBuf::from("/definitely/not/here.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Other(_)));
    }
}
