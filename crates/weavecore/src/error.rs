use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Node '{node_id}' failed: {source}")]
    Activity {
        node_id: String,
        #[source]
        source: ActivityError,
    },

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Invalid parameter kind: {0}")]
    InvalidParameterKind(String),

    #[error("Malformed parameter schema: {0}")]
    Malformed(String),

    #[error("Parameter '{name}' of type {kind} cannot declare '{field}'")]
    MisplacedField {
        name: String,
        kind: String,
        field: &'static str,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActivityError {
    #[error("Missing required input parameter: {0}")]
    MissingInputParameter(String),

    #[error("Unexpected input parameter: {0}")]
    UnexpectedInputParameter(String),

    #[error("Invalid type for input '{name}': expected {expected}, got {actual}")]
    InvalidInputType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Missing output parameter: {0}")]
    MissingOutputParameter(String),

    #[error("Unexpected output parameter: {0}")]
    UnexpectedOutputParameter(String),

    #[error("Invalid type for output '{name}': expected {expected}, got {actual}")]
    InvalidOutputType {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Activity type {0} already registered")]
    DuplicateActivityType(String),

    #[error("Activity type {0} not found")]
    UnknownActivityType(String),

    #[error("Missing required parameter: {0}")]
    MissingRequiredParameter(String),

    #[error("Invalid value for {name}: expected {expected}, got {actual}")]
    InvalidRequiredParameterValue {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("Activity type {0} does not allow custom input/output parameters")]
    CustomParamsNotAllowed(String),

    #[error("Invalid parameter schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Failed to construct {activity_type}: {source}")]
    Construction {
        activity_type: String,
        #[source]
        source: ActivityError,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(String),

    #[error("Duplicate node label: {0}")]
    DuplicateNodeLabel(String),

    #[error("Multiple nodes present but no connections between them")]
    NoConnectionsAmongMultipleNodes,

    #[error("Multiple connections to the same input parameter: {node}.{param}")]
    MultipleConnectionsToInput { node: String, param: String },

    #[error("Cyclic dependency detected in workflow")]
    CyclicDependency,

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("{direction} parameter {param} not found in node {node}")]
    ParameterNotFound {
        node: String,
        param: String,
        direction: ParamDirection,
    },

    #[error(
        "Type mismatch in connection: {source_node}.{source_output} ({source_kind}) \
         -> {target_node}.{target_input} ({target_kind})"
    )]
    TypeMismatch {
        source_node: String,
        source_output: String,
        source_kind: String,
        target_node: String,
        target_input: String,
        target_kind: String,
    },

    #[error("Input parameter {param} of non-root node {node} is not connected")]
    UnconnectedInput { node: String, param: String },

    #[error("Output parameter {param} of non-leaf node {node} is not connected")]
    UnconnectedOutput { node: String, param: String },

    #[error("Nodes are disconnected from the workflow: {}", .0.join(", "))]
    DisconnectedNodes(Vec<String>),
}

/// Which side of an activity a parameter lookup refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDirection {
    Input,
    Output,
}

impl std::fmt::Display for ParamDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamDirection::Input => write!(f, "Input"),
            ParamDirection::Output => write!(f, "Output"),
        }
    }
}
