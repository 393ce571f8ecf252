//! Human-readable status output.
//!
//! Everything user-facing the probe prints goes through here: the banner, the
//! configuration echo (never the secret), the payload echo and the final
//! success or failure verdict. Pure formatting, no decisions.

// Local crates
use crate::helpers::load_config::Config;
use crate::ingestion::models::LogRecord;

// External crates
use anyhow::{Context, Result};
use chrono::Utc;
use std::fmt;

const SEPARATOR: &str =
    "======================================================================";

/// Prefix/suffix Azure Monitor wraps around custom table streams.
const STREAM_PREFIX: &str = "Custom-";
const STREAM_SUFFIX: &str = "_CL";

/// Destination table name implied by a stream name, for the KQL hint.
/// `Custom-TestData_CL` names the `TestData` table.
pub fn derive_table_name(stream_name: &str) -> &str {
    let name = stream_name.strip_prefix(STREAM_PREFIX).unwrap_or(stream_name);
    name.strip_suffix(STREAM_SUFFIX).unwrap_or(name)
}

pub fn print_banner() {
    println!("{SEPARATOR}");
    println!("Azure Monitor Ingestion Probe");
    println!("One-shot DCE/DCR pipeline verification");
    println!("{SEPARATOR}");
}

pub fn print_config(config: &Config, record_count: usize) {
    println!("\nConfiguration:");
    println!("  Tenant ID: {}", config.identity.tenant_id);
    println!("  Client ID: {}", config.identity.client_id);
    println!("  DCE Endpoint: {}", config.ingestion.dce_endpoint);
    println!("  DCR ID: {}", config.ingestion.dcr_id);
    println!("  Stream Name: {}", config.ingestion.stream_name);
    println!("  Records to send: {record_count}");
}

pub fn print_payload(records: &[LogRecord]) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(records).context("Failed to render sample payload")?;
    println!("\nSample data to be sent:");
    println!("{rendered}");
    Ok(())
}

/// Progress line for the next pipeline phase.
pub fn step(message: &str) {
    println!("\n{message}");
}

/// Acknowledgment that the previous phase completed.
pub fn step_ok(message: &str) {
    println!("✓ {message}");
}

pub fn print_success(record_count: usize, stream_name: &str) {
    println!("\n{SEPARATOR}");
    println!("✓ SUCCESS! Data has been ingested.");
    println!("  Records sent: {record_count}");
    println!("  Response: HTTP 204 No Content (success)");
    println!("  Timestamp: {} UTC", Utc::now().format("%Y-%m-%d %H:%M:%S"));

    println!("\nTo query the data in the destination workspace, use this KQL query:");
    println!("  {} | take 10", derive_table_name(stream_name));
    println!("\nNote: it may take 5-10 minutes for data to appear");
    println!("{SEPARATOR}");
}

pub fn print_missing_fields(missing: &[&str]) {
    println!("\n✗ ERROR: Please configure all required settings:");
    for field in missing {
        println!("  - {field}");
    }
    println!("\nFind these values in the Azure Portal:");
    println!("  - App Registration for tenant id, client id and client secret");
    println!("  - Monitor > Data Collection Endpoints for the DCE URL");
    println!("  - Monitor > Data Collection Rules for the DCR immutableId and stream");
}

pub fn print_api_failure(error: &dyn fmt::Display) {
    println!("\n{SEPARATOR}");
    println!("✗ FAILED! Azure API error:");
    println!("  {error}");
    println!("\nPlease check:");
    println!("  1. The app registration has the 'Monitoring Metrics Publisher' role on the DCR");
    println!("  2. The DCE endpoint URL is correct");
    println!("  3. The DCR immutableId is correct");
    println!("  4. The stream name matches the DCR configuration");
    println!("{SEPARATOR}");
}

pub fn print_generic_failure(error: &dyn fmt::Display) {
    println!("\n{SEPARATOR}");
    println!("✗ FAILED! Unexpected error:");
    println!("  {error:#}");
    println!("{SEPARATOR}");
}
