//! Core abstractions for the workflow engine
//!
//! Values, typed parameter schemas, the activity contract, the workflow
//! graph model with its validator, and execution events. Every other crate
//! in the workspace builds on these types.

mod activity;
mod error;
mod events;
mod parameter;
mod value;
pub mod validation;
mod workflow;

pub use activity::{Activity, ActivityDescriptor, ActivityId};
pub use error::{
    ActivityError, FlowError, ParamDirection, RegistryError, SchemaError, WorkflowError,
};
pub use events::{EventBus, ExecutionEvent, ExecutionId};
pub use parameter::{param_map, parse_param_map, ParamKind, ParamMap, ParamType, Parameter};
pub use validation::{DependencyGraph, Topology};
pub use value::{Value, ValueMap};
pub use workflow::{
    Connection, NodeDefinition, NodeId, Workflow, WorkflowDefinition, WorkflowInputs,
    WorkflowNode,
};

/// Result type for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;
