// External crates
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};

/// Timestamp layout the ingestion service expects for `TimeGenerated`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One log record as submitted to the Data Collection Endpoint.
///
/// Records are built in memory for a single upload and never persisted. The
/// only shape the probe guarantees is a `TimeGenerated` UTC instant; the
/// `RawData` payload is free-form JSON and deliberately not schema-checked,
/// since mapping it into a table column is the Data Collection Rule's job.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    #[serde(rename = "TimeGenerated")]
    pub time_generated: String,
    #[serde(rename = "RawData")]
    pub raw_data: Value,
}

impl LogRecord {
    pub fn new(at: DateTime<Utc>, raw_data: Value) -> Self {
        Self {
            time_generated: at.format(TIMESTAMP_FORMAT).to_string(),
            raw_data,
        }
    }
}

/// The fixed two-record batch the probe ships: one synthetic login event and
/// one synthetic file access event, enough to verify routing end to end.
pub fn sample_batch(now: DateTime<Utc>) -> Vec<LogRecord> {
    vec![
        LogRecord::new(
            now,
            json!({
                "SchemaType": "UserLogin",
                "UserId": "user123",
                "Action": "Login",
                "Details": {
                    "IP": "192.168.1.1",
                    "Success": true
                }
            }),
        ),
        LogRecord::new(
            now,
            json!({
                "SchemaType": "FileAccess",
                "FileName": "secret.txt",
                "Operation": "Read",
                "Size": 1024
            }),
        ),
    ]
}
