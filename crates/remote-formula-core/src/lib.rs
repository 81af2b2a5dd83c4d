//! Core abstractions for remote formula execution.
//!
//! This crate provides the fundamental building blocks:
//! - `Session` and `Context` - Authorization and scope for remote calls
//! - `FormulaDescriptor` / `SubmittedCommand` - What gets executed
//! - `ExecutionOutcome` - Typed result of one status poll
//! - `StatusSource`, `ProgressSink` and `Prompter` traits

pub mod context;
pub mod formula;
pub mod outcome;
pub mod traits;

pub use context::{Context, Session};
pub use formula::{
    FormulaCatalog, FormulaDescriptor, InputKind, InputSpec, InputValue, SubmittedCommand,
};
pub use outcome::{ExecutionId, ExecutionOutcome, ExecutionReport};
pub use traits::{NullSink, PollEvent, ProgressSink, PromptError, Prompter, StatusSource};
