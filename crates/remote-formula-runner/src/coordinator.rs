//! Poll coordinator: drives one submitted execution to a terminal outcome.
//!
//! A foreground ticker fires every `cadence` from the start instant. The
//! first attempt starts immediately and every tick below `budget` starts
//! another one, so attempts may overlap. Attempts race to a single
//! [`CompletionSignal`]; the first `Ready` or authorization failure wins.
//! The first tick at or past `budget` declares `TimedOut`.

use std::{sync::Arc, time::Duration};

use remote_formula_core::{
    Context, ExecutionId, ExecutionOutcome, ExecutionReport, PollEvent, ProgressSink, Session,
    StatusSource,
};
use tokio::{
    sync::oneshot,
    task::JoinSet,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    config::{ConfigError, PollConfig},
    signal::{AttemptSignal, CompletionSignal},
};

/// Terminal outcome of one coordinated execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// An attempt observed `Ready` before the budget ran out.
    Completed(ExecutionReport),
    /// The budget ran out. The execution may still finish server-side and
    /// can be checked later with the same id and context.
    TimedOut {
        execution_id: ExecutionId,
        context: Context,
        waited: Duration,
    },
    /// An attempt hit an authorization failure. Polling stopped.
    Failed {
        execution_id: ExecutionId,
        reason: String,
    },
}

/// Everything an attempt needs, shared read-only across attempts.
struct AttemptScope<S> {
    source: Arc<S>,
    sink: Arc<dyn ProgressSink>,
    session: Arc<Session>,
    execution_id: ExecutionId,
    context: Context,
    pacing_steps: u32,
    pacing_interval: Duration,
    signal: CompletionSignal,
}

impl<S> AttemptScope<S> {
    /// Forward progress unless the coordinator already settled.
    fn report(&self, event: PollEvent) {
        if !self.signal.is_settled() {
            self.sink.notify(event);
        }
    }
}

/// One fetch-and-interpret cycle.
async fn poll_attempt<S: StatusSource>(scope: Arc<AttemptScope<S>>, attempt: u32) {
    scope.report(PollEvent::Awaiting { attempt });
    for step in 1..=scope.pacing_steps {
        time::sleep(scope.pacing_interval).await;
        scope.report(PollEvent::Pacing { attempt, step });
    }

    let outcome = scope
        .source
        .fetch(&scope.session, &scope.execution_id, &scope.context)
        .await;

    match outcome {
        ExecutionOutcome::Ready(report) => {
            if scope.signal.fire(AttemptSignal::Ready(report)) {
                tracing::debug!("Attempt {attempt} observed completion of {}", scope.execution_id);
            } else {
                tracing::trace!("Attempt {attempt} result discarded, already settled");
            }
        }
        ExecutionOutcome::Pending | ExecutionOutcome::NotFound => {
            tracing::trace!("Attempt {attempt}: {} not ready", scope.execution_id);
        }
        ExecutionOutcome::AuthError(reason) => {
            tracing::warn!("Attempt {attempt} unauthorized: {reason}");
            scope.signal.fire(AttemptSignal::Unauthorized(reason));
        }
        ExecutionOutcome::TransientError(reason) => {
            tracing::warn!("Attempt {attempt} failed: {reason}");
            scope.report(PollEvent::Retrying { attempt, reason });
        }
    }
}

/// Timeout / retry state machine over a [`StatusSource`].
pub struct PollCoordinator<S> {
    source: Arc<S>,
    sink: Arc<dyn ProgressSink>,
    config: PollConfig,
}

impl<S> PollCoordinator<S>
where
    S: StatusSource + 'static,
{
    /// Create a coordinator.
    ///
    /// # Errors
    /// Returns error if `config` is invalid.
    pub fn new(
        source: Arc<S>,
        sink: Arc<dyn ProgressSink>,
        config: PollConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            source,
            sink,
            config,
        })
    }

    /// Poll `execution_id` until it completes, the budget runs out, or
    /// authorization fails. Exactly one outcome is returned.
    ///
    /// On `Completed` and `TimedOut`, attempts still in flight are detached
    /// and their results ignored. On `Failed` they are aborted.
    pub async fn run(
        &self,
        session: Arc<Session>,
        execution_id: ExecutionId,
        context: Context,
    ) -> PollOutcome {
        let start = Instant::now();
        let (signal, mut completion) = CompletionSignal::new();
        let scope = Arc::new(AttemptScope {
            source: Arc::clone(&self.source),
            sink: Arc::clone(&self.sink),
            session,
            execution_id: execution_id.clone(),
            context: context.clone(),
            pacing_steps: self.config.pacing_steps,
            pacing_interval: self.config.pacing_interval,
            signal: signal.clone(),
        });

        let mut attempts = JoinSet::new();
        let mut launched = 1;
        attempts.spawn(poll_attempt(Arc::clone(&scope), launched));

        let mut ticker = time::interval_at(start + self.config.cadence, self.config.cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

        loop {
            tokio::select! {
                biased;

                received = &mut completion => {
                    return Self::settle(received, &mut attempts, &execution_id);
                }

                tick = ticker.tick() => {
                    Self::reap(&mut attempts);

                    let elapsed = tick.duration_since(start);
                    if elapsed >= self.config.budget {
                        signal.close();
                        // An attempt may have fired between the select and the close.
                        if let Ok(late) = completion.try_recv() {
                            return Self::settle(Ok(late), &mut attempts, &execution_id);
                        }
                        tracing::info!(
                            "Gave up waiting for {execution_id} after {elapsed:?} ({launched} attempts, {} in flight)",
                            attempts.len()
                        );
                        attempts.detach_all();
                        return PollOutcome::TimedOut {
                            execution_id,
                            context,
                            waited: elapsed,
                        };
                    }

                    if self.config.coalesce_attempts && !attempts.is_empty() {
                        tracing::trace!("Tick at {elapsed:?} skipped, attempt still in flight");
                        continue;
                    }

                    launched += 1;
                    tracing::debug!("Tick at {elapsed:?}, starting attempt {launched}");
                    attempts.spawn(poll_attempt(Arc::clone(&scope), launched));
                }
            }
        }
    }

    fn settle(
        received: Result<AttemptSignal, oneshot::error::RecvError>,
        attempts: &mut JoinSet<()>,
        execution_id: &ExecutionId,
    ) -> PollOutcome {
        match received {
            Ok(AttemptSignal::Ready(report)) => {
                attempts.detach_all();
                PollOutcome::Completed(report)
            }
            Ok(AttemptSignal::Unauthorized(reason)) => {
                attempts.abort_all();
                PollOutcome::Failed {
                    execution_id: execution_id.clone(),
                    reason,
                }
            }
            Err(_) => {
                attempts.abort_all();
                PollOutcome::Failed {
                    execution_id: execution_id.clone(),
                    reason: "completion signal dropped".to_string(),
                }
            }
        }
    }

    /// Drop finished attempts so the set only tracks live ones.
    fn reap(attempts: &mut JoinSet<()>) {
        while let Some(finished) = attempts.try_join_next() {
            match finished {
                Err(e) if e.is_panic() => tracing::error!("Poll attempt panicked: {e}"),
                _ => {}
            }
        }
    }
}
