//! Seams between the poll engine and its collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{Context, ExecutionId, ExecutionOutcome, Session};

/// Source of execution status, one call per poll attempt.
///
/// Implementations must be safe to call after the caller has stopped
/// listening: late calls are issued by attempts whose results are discarded.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Fetch the current status of an execution.
    ///
    /// Never fails; every failure is folded into an [`ExecutionOutcome`].
    async fn fetch(
        &self,
        session: &Session,
        execution_id: &ExecutionId,
        context: &Context,
    ) -> ExecutionOutcome;
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    async fn fetch(
        &self,
        session: &Session,
        execution_id: &ExecutionId,
        context: &Context,
    ) -> ExecutionOutcome {
        (**self).fetch(session, execution_id, context).await
    }
}

/// User-visible progress emitted by poll attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// An attempt started.
    Awaiting { attempt: u32 },
    /// One pacing pause of an attempt elapsed.
    Pacing { attempt: u32, step: u32 },
    /// An attempt hit a transient failure and gave up; the next tick retries.
    Retrying { attempt: u32, reason: String },
}

/// Receiver of user-visible progress.
pub trait ProgressSink: Send + Sync {
    fn notify(&self, event: PollEvent);

    /// Step narration outside polling ("Authenticating...", "done").
    fn status(&self, _message: &str) {}
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn notify(&self, _event: PollEvent) {}
}

/// Prompt error.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt cancelled")]
    Cancelled,
    #[error("Nothing to choose from: {0}")]
    NoChoices(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Interactive input collection.
///
/// The framework decides what to ask; your app implements the UX.
pub trait Prompter: Send + Sync {
    /// Pick one of `items`.
    ///
    /// # Errors
    /// Returns error if input cannot be read or `items` is empty.
    fn select(&self, label: &str, items: &[String]) -> Result<String, PromptError>;

    /// Free text. An empty answer is only accepted when `required` is false.
    ///
    /// # Errors
    /// Returns error if input cannot be read.
    fn text(&self, label: &str, required: bool) -> Result<String, PromptError>;

    /// Yes/no question.
    ///
    /// # Errors
    /// Returns error if input cannot be read.
    fn confirm(&self, label: &str) -> Result<bool, PromptError>;

    /// Hidden entry.
    ///
    /// # Errors
    /// Returns error if input cannot be read.
    fn password(&self, label: &str) -> Result<String, PromptError>;
}
