//! Submission and polling engine for remote formulas.
//!
//! Provides:
//! - `PollCoordinator` - Drive one execution to Completed, TimedOut or Failed
//! - `FormulaRunner` - The exec / check / set-credential flows
//! - Result presentation and input collection

pub mod config;
pub mod coordinator;
pub mod flow;
pub mod inputs;
pub mod presenter;
mod signal;

pub use config::{ConfigError, PollConfig};
pub use coordinator::{PollCoordinator, PollOutcome};
pub use flow::{CheckOutcome, Credentials, ExecOptions, ExecOutcome, FlowError, FormulaRunner};
pub use inputs::collect_inputs;
pub use presenter::ConsoleSink;
