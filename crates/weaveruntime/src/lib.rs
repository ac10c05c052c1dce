//! Workflow execution runtime
//!
//! This crate provides the activity registry that turns stored
//! `{activity_type, params}` pairs into runnable activities, and the engine
//! that runs validated workflows as DAGs.

mod executor;
mod registry;
mod runtime;

pub use executor::{ExecutionResult, WorkflowExecutor};
pub use registry::{
    ActivityFactory, ActivityKind, ActivityParams, ActivityRegistry, ActivityTypeInfo,
};
pub use runtime::{RuntimeConfig, WeaveRuntime};
