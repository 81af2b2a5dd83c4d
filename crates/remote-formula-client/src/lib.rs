//! HTTP client for the remote formula execution service.
//!
//! Provides:
//! - Wire protocol (JSON, epoch-second timestamps)
//! - `ApiClient` - login, formula catalog, command submission,
//!   execution status and credential storage

pub mod client;
pub mod config;
pub mod error;
pub mod protocol;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{AuthError, CatalogError, ClientError, CredentialError, SubmitError};
pub use protocol::{CredentialRequest, ProviderCredential};
