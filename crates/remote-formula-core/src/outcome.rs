//! Execution identity and poll outcomes.

use std::{fmt, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::InputValue;

/// Client-generated identifier of one execution.
///
/// Immutable once generated; the server is trusted to echo it back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(String);

impl ExecutionId {
    /// Generate a fresh random (v4) identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an identifier received out-of-band (e.g. to resume a check).
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result payload of a finished execution.
///
/// Times travel as Unix epoch seconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub execution_id: ExecutionId,
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub user: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub submitted_inputs: Vec<InputValue>,
}

impl ExecutionReport {
    /// Reported execution duration (`end_time - start_time`).
    ///
    /// Clamped to zero if the server reports an end before the start.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        (self.end_time - self.start_time)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

/// Interpretation of one status poll.
///
/// Produced fresh on each attempt and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Known to the server, not finished yet.
    Pending,
    /// Finished; carries the result payload.
    Ready(ExecutionReport),
    /// Server has no record yet (404). Not an error.
    NotFound,
    /// Authorization rejected (401/403). Never retried.
    AuthError(String),
    /// Network, decoding or unexpected-status failure. Retried on the next tick.
    TransientError(String),
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn report(start: i64, end: i64) -> ExecutionReport {
        ExecutionReport {
            execution_id: ExecutionId::new("exec-1"),
            status_code: 0,
            user: "dev".into(),
            start_time: Utc.timestamp_opt(start, 0).unwrap(),
            end_time: Utc.timestamp_opt(end, 0).unwrap(),
            stdout: "ok".into(),
            stderr: String::new(),
            submitted_inputs: vec![],
        }
    }

    #[test]
    fn test_epoch_seconds_roundtrip() {
        let original = report(1_700_000_000, 1_700_000_042);
        let json = serde_json::to_value(&original).unwrap();
        assert_eq!(json["startTime"], 1_700_000_000);
        assert_eq!(json["endTime"], 1_700_000_042);

        let decoded: ExecutionReport = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.start_time, original.start_time);
        assert_eq!(decoded.end_time, original.end_time);
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(report(100, 142).elapsed(), Duration::from_secs(42));
        assert_eq!(report(100, 100).elapsed(), Duration::ZERO);
        assert_eq!(report(100, 90).elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_generated_ids_are_uuid_v4() {
        let id = ExecutionId::generate();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }
}
