//! Wire protocol for the formula execution service.

use chrono::{DateTime, Utc};
use remote_formula_core::{ExecutionId, ExecutionOutcome, ExecutionReport, InputValue};
use serde::{Deserialize, Serialize};

/// Organization header.
pub const HEADER_ORG: &str = "x-org";
/// Session token header.
pub const HEADER_AUTHORIZATION: &str = "x-authorization";
/// Context header.
pub const HEADER_CONTEXT: &str = "x-ctx";

/// Status value marking a finished execution.
pub const STATUS_READY: &str = "Ready";

/// Body of `POST /login`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of a `200` from `GET /executions/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub content: Option<ExecutionContent>,
}

/// Execution details inside an [`ExecutionEnvelope`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub user: String,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub formula_err: String,
    #[serde(default)]
    pub formula_output: String,
    #[serde(default)]
    pub formula_inputs: Option<Vec<InputValue>>,
}

impl ExecutionEnvelope {
    /// Interpret this envelope for the execution that was asked about.
    ///
    /// A `Ready` envelope without content or timing is a decoding failure.
    #[must_use]
    pub fn into_outcome(self, requested: &ExecutionId) -> ExecutionOutcome {
        if self.status != STATUS_READY {
            return ExecutionOutcome::Pending;
        }

        let Some(content) = self.content else {
            return ExecutionOutcome::TransientError("ready execution without content".to_string());
        };
        let (Some(start_time), Some(end_time)) = (content.start_time, content.end_time) else {
            return ExecutionOutcome::TransientError("ready execution without timing".to_string());
        };

        let execution_id = if content.id.is_empty() {
            requested.clone()
        } else {
            ExecutionId::new(content.id)
        };

        ExecutionOutcome::Ready(ExecutionReport {
            execution_id,
            status_code: content.status_code,
            user: content.user,
            start_time,
            end_time,
            stdout: content.formula_output,
            stderr: content.formula_err,
            submitted_inputs: content.formula_inputs.unwrap_or_default(),
        })
    }
}

/// Provider-specific credential shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ProviderCredential {
    Github {
        username: String,
        token: String,
    },
    Aws {
        accesskeyid: String,
        secretaccesskey: String,
    },
}

impl ProviderCredential {
    /// Build the credential shape for `provider`.
    ///
    /// `github` takes a username and token; every other provider is stored
    /// as an access key pair.
    #[must_use]
    pub fn for_provider(provider: &str, id: impl Into<String>, secret: impl Into<String>) -> Self {
        if provider == "github" {
            Self::Github {
                username: id.into(),
                token: secret.into(),
            }
        } else {
            Self::Aws {
                accesskeyid: id.into(),
                secretaccesskey: secret.into(),
            }
        }
    }

    /// Prompt labels for the identifier and secret of `provider`.
    #[must_use]
    pub fn labels(provider: &str) -> (&'static str, &'static str) {
        if provider == "github" {
            ("Username", "Token")
        } else {
            ("AccessKeyID", "SecretAccessKey")
        }
    }
}

/// Body of `POST /credentials`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRequest {
    pub service: String,
    pub credential: ProviderCredential,
}

impl CredentialRequest {
    /// Create a credential request for `provider`.
    #[must_use]
    pub fn new(provider: impl Into<String>, id: impl Into<String>, secret: impl Into<String>) -> Self {
        let service = provider.into();
        let credential = ProviderCredential::for_provider(&service, id, secret);
        Self { service, credential }
    }
}
