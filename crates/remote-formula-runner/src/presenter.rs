//! Human-readable rendering of progress and outcomes.

use std::{fmt, io::Write as _, time::Duration};

use remote_formula_core::{Context, ExecutionId, ExecutionReport, PollEvent, ProgressSink};

/// Line framing a result block.
pub const SEPARATOR: &str = "-----------------------";

/// Format a duration as `1h2m3s`, omitting leading zero units.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Full result block shown when polling completes.
struct ReportBlock<'a>(&'a ExecutionReport);

impl fmt::Display for ReportBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "{SEPARATOR}")?;
        writeln!(f, "Execution ID: {}", report.execution_id)?;
        writeln!(f, "Execution time: {}", format_elapsed(report.elapsed()))?;
        writeln!(f, "User: {}", report.user)?;
        writeln!(f)?;
        // Best effort: a report whose inputs cannot be serialized still prints.
        if let Ok(inputs) = serde_json::to_string(&report.submitted_inputs) {
            writeln!(f, "inputs:")?;
            writeln!(f, "{inputs}")?;
            writeln!(f)?;
        }
        writeln!(f, "stdout:")?;
        writeln!(f, "{}", report.stdout)?;
        writeln!(f)?;
        writeln!(f, "stderr:")?;
        writeln!(f, "{}", report.stderr)?;
        write!(f, "{SEPARATOR}")
    }
}

/// Render the full block for a completed execution.
#[must_use]
pub fn render_report(report: &ExecutionReport) -> String {
    ReportBlock(report).to_string()
}

/// Render the compact block used when checking an execution later.
#[must_use]
pub fn render_check(report: &ExecutionReport) -> String {
    format!(
        "Execution ID: {}\nExecution time: {}\n-----\nstdout:\n{}\nstderr:\n{}",
        report.execution_id,
        format_elapsed(report.elapsed()),
        report.stdout,
        report.stderr
    )
}

/// Message shown when a checked execution has no result yet.
pub const NOT_READY_MESSAGE: &str = "Execution not found or it's being processed";

/// Render the resume instructions for an execution that outlived the budget.
#[must_use]
pub fn render_timed_out(execution_id: &ExecutionId, context: &Context) -> String {
    format!(
        "Your request is being processed. You can check the execution with the command \
         [remote-formula check --execution-id {execution_id} --context {context}]\n\
         Execution ID: {execution_id}\n\
         Execution context: {context}"
    )
}

/// Render one progress event.
#[must_use]
pub fn render_event(event: &PollEvent) -> String {
    match event {
        PollEvent::Awaiting { .. } => "Awaiting execution...".to_string(),
        PollEvent::Pacing { step, .. } => ".".repeat(usize::try_from(*step).unwrap_or(1)),
        PollEvent::Retrying { reason, .. } => format!("{reason}\nRetrying..."),
    }
}

/// Progress sink that prints to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    fn line(text: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{text}") {
            tracing::debug!("Failed to write progress: {e}");
        }
    }
}

impl ProgressSink for ConsoleSink {
    fn notify(&self, event: PollEvent) {
        Self::line(&render_event(&event));
    }

    fn status(&self, message: &str) {
        Self::line(message);
    }
}
