//! Poll coordinator settings.

use std::time::Duration;

use thiserror::Error;

/// Default wall-clock budget for one execution.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(60);
/// Default tick cadence, measured from the coordinator's start.
pub const DEFAULT_CADENCE: Duration = Duration::from_secs(6);
/// Default number of pacing pauses before each fetch.
pub const DEFAULT_PACING_STEPS: u32 = 5;
/// Default length of one pacing pause.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_secs(1);

/// Invalid poll settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Poll cadence must be greater than zero")]
    ZeroCadence,
    #[error("Poll budget {budget:?} is shorter than the cadence {cadence:?}")]
    BudgetBelowCadence { budget: Duration, cadence: Duration },
}

/// Timing of the poll coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Give up (TimedOut) on the first tick at or after this much time.
    pub budget: Duration,
    /// Interval between ticks; every tick below budget starts an attempt.
    pub cadence: Duration,
    /// Pauses an attempt takes before fetching, each reported as progress.
    pub pacing_steps: u32,
    pub pacing_interval: Duration,
    /// Skip a tick's attempt while another one is still in flight.
    pub coalesce_attempts: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            budget: DEFAULT_BUDGET,
            cadence: DEFAULT_CADENCE,
            pacing_steps: DEFAULT_PACING_STEPS,
            pacing_interval: DEFAULT_PACING_INTERVAL,
            coalesce_attempts: false,
        }
    }
}

impl PollConfig {
    /// Default config with a different budget and cadence.
    #[must_use]
    pub fn with_timing(budget: Duration, cadence: Duration) -> Self {
        Self {
            budget,
            cadence,
            ..Self::default()
        }
    }

    /// Check the settings.
    ///
    /// # Errors
    /// Returns error if the cadence is zero or the budget is shorter than it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cadence.is_zero() {
            return Err(ConfigError::ZeroCadence);
        }
        if self.budget < self.cadence {
            return Err(ConfigError::BudgetBelowCadence {
                budget: self.budget,
                cadence: self.cadence,
            });
        }
        Ok(())
    }
}
