//! Client error types, one per remote operation.

use reqwest::StatusCode;
use thiserror::Error;

/// Client construction error.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

/// Login error. Fatal to the whole run; never retried.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("login failed! Verify your credentials")]
    InvalidCredentials,
    #[error("login failed ({0})")]
    Rejected(StatusCode),
    #[error("error performing login: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("error decoding login response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Formula catalog error.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("authorization failed! Verify your credentials")]
    Unauthorized,
    #[error("error obtaining formulas ({0})")]
    Rejected(StatusCode),
    #[error("error obtaining formulas: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("error decoding formulas: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Command submission error. Fatal; the client never re-submits.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("authorization failed! Verify your credentials")]
    Unauthorized,
    #[error("command failed ({0})")]
    Rejected(StatusCode),
    #[error("error sending command: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Credential storage error.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("set credential failed! Verify your credentials")]
    Unauthorized,
    #[error("set credential failed! You have no access for the resource")]
    Forbidden,
    #[error("set credential failed: {status} {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("error setting credential: {0}")]
    Transport(#[source] reqwest::Error),
}
