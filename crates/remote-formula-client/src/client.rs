//! Remote service client.

use async_trait::async_trait;
use remote_formula_core::{
    Context, ExecutionId, ExecutionOutcome, FormulaCatalog, FormulaDescriptor, InputValue, Session,
    StatusSource, SubmittedCommand,
};
use reqwest::{RequestBuilder, Response, StatusCode, Url};

use crate::{
    config::ClientConfig,
    error::{AuthError, CatalogError, ClientError, CredentialError, SubmitError},
    protocol::{
        CredentialRequest, ExecutionEnvelope, HEADER_AUTHORIZATION, HEADER_CONTEXT, HEADER_ORG,
        LoginRequest,
    },
};

/// Client for the formula execution service.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    org: String,
}

impl ApiClient {
    /// Create a client from explicit configuration.
    ///
    /// # Errors
    /// Returns error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                url: config.base_url,
                reason: "not a hierarchical URL".to_string(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            base,
            org: config.org,
        })
    }

    /// Build an endpoint URL from path segments (each segment is escaped).
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request
            .header(HEADER_ORG, &self.org)
            .header(HEADER_AUTHORIZATION, &session.token)
    }

    fn scoped(&self, request: RequestBuilder, session: &Session, context: &Context) -> RequestBuilder {
        self.authorized(request, session)
            .header(HEADER_CONTEXT, context.as_str())
    }

    /// Exchange credentials for a session.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidCredentials`] on 401, and a generic
    /// [`AuthError`] for any other failure.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .http
            .post(self.endpoint(&["login"]))
            .header(HEADER_ORG, &self.org)
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(AuthError::Transport)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await.map_err(AuthError::Transport)?;
                serde_json::from_slice(&body).map_err(AuthError::Decode)
            }
            StatusCode::UNAUTHORIZED => Err(AuthError::InvalidCredentials),
            status => {
                tracing::debug!("Login rejected with {status}");
                Err(AuthError::Rejected(status))
            }
        }
    }

    /// Fetch the contexts and formulas visible to this session.
    ///
    /// # Errors
    /// Returns error on authorization failure, unexpected status or bad body.
    pub async fn formulas(&self, session: &Session) -> Result<FormulaCatalog, CatalogError> {
        let response = self
            .authorized(self.http.get(self.endpoint(&["formulas"])), session)
            .send()
            .await
            .map_err(CatalogError::Transport)?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await.map_err(CatalogError::Transport)?;
                serde_json::from_slice(&body).map_err(CatalogError::Decode)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CatalogError::Unauthorized),
            status => Err(CatalogError::Rejected(status)),
        }
    }

    /// Submit `formula` with the collected inputs for asynchronous execution.
    ///
    /// The execution id is generated here, before the request is sent, and
    /// returned on success. Exactly one execution is enqueued per successful
    /// call; nothing is re-submitted.
    ///
    /// # Errors
    /// Returns [`SubmitError::Unauthorized`] on 401/403, and a generic
    /// [`SubmitError`] for any other failure.
    pub async fn submit(
        &self,
        formula: &FormulaDescriptor,
        session: &Session,
        context: &Context,
        inputs: Vec<InputValue>,
    ) -> Result<ExecutionId, SubmitError> {
        let command = SubmittedCommand::new(formula, inputs);
        tracing::debug!(
            "Submitting '{}' as {} in context {}",
            command.command,
            command.id,
            context
        );

        let response = self
            .scoped(self.http.post(self.endpoint(&["commands"])), session, context)
            .json(&command)
            .send()
            .await
            .map_err(SubmitError::Transport)?;

        match response.status() {
            StatusCode::CREATED => Ok(command.id),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SubmitError::Unauthorized),
            status => Err(SubmitError::Rejected(status)),
        }
    }

    /// Store a provider credential under `context`.
    ///
    /// # Errors
    /// Returns error on 401, 403, any other non-201 status, or transport failure.
    pub async fn set_credential(
        &self,
        session: &Session,
        context: &Context,
        request: &CredentialRequest,
    ) -> Result<(), CredentialError> {
        let response = self
            .scoped(self.http.post(self.endpoint(&["credentials"])), session, context)
            .json(request)
            .send()
            .await
            .map_err(CredentialError::Transport)?;

        match response.status() {
            StatusCode::CREATED => Ok(()),
            StatusCode::UNAUTHORIZED => Err(CredentialError::Unauthorized),
            StatusCode::FORBIDDEN => Err(CredentialError::Forbidden),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(CredentialError::Rejected { status, body })
            }
        }
    }

    async fn interpret_status(response: Response, execution_id: &ExecutionId) -> ExecutionOutcome {
        match response.status() {
            StatusCode::OK => {
                let body = match response.bytes().await {
                    Ok(body) => body,
                    Err(e) => {
                        return ExecutionOutcome::TransientError(format!(
                            "error reading response: {e}"
                        ));
                    }
                };
                match serde_json::from_slice::<ExecutionEnvelope>(&body) {
                    Ok(envelope) => envelope.into_outcome(execution_id),
                    Err(e) => {
                        ExecutionOutcome::TransientError(format!("error decoding response: {e}"))
                    }
                }
            }
            StatusCode::NOT_FOUND => ExecutionOutcome::NotFound,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExecutionOutcome::AuthError(
                "authorization failed! Verify your credentials".to_string(),
            ),
            status => ExecutionOutcome::TransientError(format!("error getting execution ({status})")),
        }
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn fetch(
        &self,
        session: &Session,
        execution_id: &ExecutionId,
        context: &Context,
    ) -> ExecutionOutcome {
        let url = self.endpoint(&["executions", execution_id.as_str()]);
        let response = match self.scoped(self.http.get(url), session, context).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Status request for {execution_id} failed: {e}");
                return ExecutionOutcome::TransientError(format!("error getting execution: {e}"));
            }
        };

        tracing::trace!("Status for {execution_id}: {}", response.status());
        Self::interpret_status(response, execution_id).await
    }
}
