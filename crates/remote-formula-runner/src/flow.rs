//! End-to-end flows: exec formula, check execution, set credential.

use std::{fmt, sync::Arc};

use remote_formula_client::{
    ApiClient, AuthError, CatalogError, ClientError, CredentialError, CredentialRequest,
    ProviderCredential, SubmitError,
};
use remote_formula_core::{
    Context, ExecutionId, ExecutionOutcome, ExecutionReport, FormulaCatalog, ProgressSink,
    PromptError, Prompter, Session, StatusSource,
};
use thiserror::Error;

use crate::{
    config::{ConfigError, PollConfig},
    coordinator::{PollCoordinator, PollOutcome},
    inputs::{collect_inputs, local_address, origin_input},
};

/// Flow error.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Unknown formula: {0}")]
    UnknownFormula(String),
    #[error("{reason}")]
    PollFailed {
        execution_id: ExecutionId,
        reason: String,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Status(String),
}

/// Login credentials for the remote service.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Options for [`FormulaRunner::exec_formula`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecOptions {
    /// Append the caller's local address as an `IPAddr` input.
    pub tag_origin: bool,
}

/// Result of a submitted execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Completed(ExecutionReport),
    /// Still running when the poll budget ran out; check it later.
    TimedOut {
        execution_id: ExecutionId,
        context: Context,
    },
}

/// Result of checking an execution once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    Ready(ExecutionReport),
    NotReady,
}

/// Runs the user-facing flows against one service.
pub struct FormulaRunner {
    client: ApiClient,
    poll: PollConfig,
    sink: Arc<dyn ProgressSink>,
}

impl FormulaRunner {
    /// Create a runner.
    ///
    /// # Errors
    /// Returns error if `poll` is invalid.
    pub fn new(
        client: ApiClient,
        poll: PollConfig,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self, FlowError> {
        poll.validate()?;
        Ok(Self { client, poll, sink })
    }

    async fn login(&self, credentials: &Credentials) -> Result<Session, FlowError> {
        self.sink.status("Authenticating...");
        let session = self
            .client
            .authenticate(&credentials.username, &credentials.password)
            .await?;
        self.sink.status("done");
        Ok(session)
    }

    async fn catalog(&self, session: &Session) -> Result<FormulaCatalog, FlowError> {
        self.sink.status("Obtaining formulas...");
        let catalog = self.client.formulas(session).await?;
        self.sink.status("done");
        Ok(catalog)
    }

    /// Authenticate, pick a formula, collect its inputs, submit, then poll
    /// until the execution completes or the budget runs out.
    ///
    /// # Errors
    /// Returns error if any step before polling fails, or
    /// [`FlowError::PollFailed`] if polling hit an authorization failure.
    pub async fn exec_formula(
        &self,
        credentials: &Credentials,
        prompter: &dyn Prompter,
        options: ExecOptions,
    ) -> Result<ExecOutcome, FlowError> {
        let session = self.login(credentials).await?;
        let catalog = self.catalog(&session).await?;

        let context = Context::new(choose(prompter, "Context", &catalog.context_names())?);
        let command = choose(prompter, "Formula", &catalog.commands())?;
        let formula = catalog
            .formula(&command)
            .ok_or_else(|| FlowError::UnknownFormula(command.clone()))?;

        let mut inputs = collect_inputs(formula, prompter)?;
        if options.tag_origin {
            match local_address() {
                Ok(address) => inputs.push(origin_input(address)),
                Err(e) => tracing::warn!("Skipping origin tag, no local address: {e}"),
            }
        }

        self.sink.status("Sending command...");
        let execution_id = self
            .client
            .submit(formula, &session, &context, inputs)
            .await?;
        self.sink.status("done");
        tracing::info!("Submitted {command} as {execution_id} in {context}");

        let coordinator = PollCoordinator::new(
            Arc::new(self.client.clone()),
            Arc::clone(&self.sink),
            self.poll.clone(),
        )?;
        match coordinator
            .run(Arc::new(session), execution_id, context)
            .await
        {
            PollOutcome::Completed(report) => Ok(ExecOutcome::Completed(report)),
            PollOutcome::TimedOut {
                execution_id,
                context,
                ..
            } => Ok(ExecOutcome::TimedOut {
                execution_id,
                context,
            }),
            PollOutcome::Failed {
                execution_id,
                reason,
            } => Err(FlowError::PollFailed {
                execution_id,
                reason,
            }),
        }
    }

    /// Fetch the state of an earlier execution once.
    ///
    /// # Errors
    /// Returns error if login fails, or the fetch reports an authorization
    /// or transport failure.
    pub async fn check_execution(
        &self,
        credentials: &Credentials,
        execution_id: &ExecutionId,
        context: &Context,
    ) -> Result<CheckOutcome, FlowError> {
        let session = self.login(credentials).await?;
        match self.client.fetch(&session, execution_id, context).await {
            ExecutionOutcome::Ready(report) => Ok(CheckOutcome::Ready(report)),
            ExecutionOutcome::Pending | ExecutionOutcome::NotFound => Ok(CheckOutcome::NotReady),
            ExecutionOutcome::AuthError(reason) => Err(FlowError::Unauthorized(reason)),
            ExecutionOutcome::TransientError(reason) => Err(FlowError::Status(reason)),
        }
    }

    /// Store a credential for `provider` under a chosen context.
    ///
    /// # Errors
    /// Returns error if prompting, login, the catalog or the store fails.
    pub async fn set_credential(
        &self,
        credentials: &Credentials,
        prompter: &dyn Prompter,
        provider: &str,
    ) -> Result<(), FlowError> {
        let (id_label, secret_label) = ProviderCredential::labels(provider);
        let id = prompter.text(id_label, true)?;
        let secret = prompter.password(secret_label)?;

        let session = self.login(credentials).await?;
        let catalog = self.catalog(&session).await?;
        let context = Context::new(choose(prompter, "Context", &catalog.context_names())?);

        self.client
            .set_credential(&session, &context, &CredentialRequest::new(provider, id, secret))
            .await?;
        tracing::info!("Stored {provider} credential in {context}");
        Ok(())
    }
}

fn choose(prompter: &dyn Prompter, label: &str, items: &[String]) -> Result<String, PromptError> {
    if items.is_empty() {
        return Err(PromptError::NoChoices(label.to_string()));
    }
    prompter.select(label, items)
}
