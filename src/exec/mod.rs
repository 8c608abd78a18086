//! Execution of the run list.

mod pipeline;
pub mod process;
pub mod stderr;

pub use pipeline::{Executor, FailurePolicy};
