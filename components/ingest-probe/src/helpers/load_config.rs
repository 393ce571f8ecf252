// External crates
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::instrument;

/// Entra ID app registration used for the client-credential exchange.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentityConfig {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

/// Data Collection Endpoint / Rule the batch is routed through.
#[derive(Debug, Deserialize, Clone)]
pub struct IngestionConfig {
    #[serde(default)]
    pub dce_endpoint: String,
    #[serde(default)]
    pub dcr_id: String,
    #[serde(default)]
    pub stream_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub identity: IdentityConfig,
    pub ingestion: IngestionConfig,
}

impl Config {
    /// Load and parse the configuration file
    #[instrument(
        name = "config_loader",
        target = "helpers::load_config",
        level = "trace",
        skip_all
    )]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        tracing::trace!(
            configuration_file_path = %path_ref.display(),
            "Loading probe configuration file"
        );

        let config_str = match fs::read_to_string(path_ref) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read configuration file");
                return Err(e)
                    .with_context(|| format!("Failed to read config file at {:?}", path_ref))?;
            }
        };
        let config: Config = match toml::from_str(&config_str) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML configuration");
                return Err(e)
                    .with_context(|| format!("Failed to parse TOML from {:?}", path_ref))?;
            }
        };

        tracing::trace!(configuration_file_path = %path_ref.display(), "Probe configuration file loaded successfully");
        Ok(config)
    }

    /// Names of required settings that are empty or whitespace-only.
    ///
    /// Presence is the only check performed here; a malformed endpoint or a
    /// wrong rule id surfaces later, when the network call is attempted.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let required: [(&'static str, &str); 6] = [
            ("identity.tenant_id", &self.identity.tenant_id),
            ("identity.client_id", &self.identity.client_id),
            ("identity.client_secret", &self.identity.client_secret),
            ("ingestion.dce_endpoint", &self.ingestion.dce_endpoint),
            ("ingestion.dcr_id", &self.ingestion.dcr_id),
            ("ingestion.stream_name", &self.ingestion.stream_name),
        ];

        required
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}
