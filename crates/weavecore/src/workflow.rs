use crate::validation::{self, Topology};
use crate::{Activity, ParamDirection, WorkflowError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type NodeId = String;

/// Runnable workflow: activity instances placed in a graph
#[derive(Clone, Default)]
pub struct Workflow {
    /// Nodes in insertion order; the order breaks scheduling ties
    pub nodes: Vec<WorkflowNode>,
    pub connections: Vec<Connection>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(
        &mut self,
        id: impl Into<NodeId>,
        activity: Arc<dyn Activity>,
        label: impl Into<String>,
    ) -> Result<NodeId, WorkflowError> {
        let id = id.into();
        if self.find_node(&id).is_some() {
            return Err(WorkflowError::DuplicateNodeId(id));
        }
        self.nodes.push(WorkflowNode {
            id: id.clone(),
            activity,
            label: label.into(),
        });
        Ok(id)
    }

    /// Map `source_output` of `source_node` onto `target_input` of
    /// `target_node`, checking both endpoints and their types first.
    pub fn connect(
        &mut self,
        source_node: impl Into<NodeId>,
        source_output: impl Into<String>,
        target_node: impl Into<NodeId>,
        target_input: impl Into<String>,
    ) -> Result<(), WorkflowError> {
        let connection = Connection {
            source_node: source_node.into(),
            source_output: source_output.into(),
            target_node: target_node.into(),
            target_input: target_input.into(),
        };
        validation::check_connection(&self.nodes, &connection)?;
        tracing::debug!("Connected {}", connection);
        self.connections.push(connection);
        Ok(())
    }

    pub fn find_node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Full structural and type validation; returns root and leaf ids
    pub fn validate(&self) -> Result<Topology, WorkflowError> {
        validation::validate(&self.nodes, &self.connections)
    }

    /// Kahn ordering of node ids, ties broken by insertion order
    pub fn topological_order(&self) -> Result<Vec<NodeId>, WorkflowError> {
        validation::topological_order(&self.nodes, &self.connections)
    }
}

impl fmt::Debug for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workflow")
            .field("nodes", &self.nodes)
            .field("connections", &self.connections)
            .finish()
    }
}

/// An activity instance placed into a workflow graph
#[derive(Clone)]
pub struct WorkflowNode {
    pub id: NodeId,
    pub activity: Arc<dyn Activity>,
    pub label: String,
}

impl WorkflowNode {
    pub(crate) fn params(&self, direction: ParamDirection) -> &crate::ParamMap {
        let descriptor = self.activity.descriptor();
        match direction {
            ParamDirection::Input => &descriptor.input_params,
            ParamDirection::Output => &descriptor.output_params,
        }
    }
}

impl fmt::Debug for WorkflowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowNode")
            .field("id", &self.id)
            .field("activity_type", &self.activity.activity_type())
            .field("label", &self.label)
            .finish()
    }
}

/// Directed edge from one node's output to another node's input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub source_node: NodeId,
    pub source_output: String,
    pub target_node: NodeId,
    pub target_input: String,
}

impl Connection {
    pub fn new(
        source_node: impl Into<NodeId>,
        source_output: impl Into<String>,
        target_node: impl Into<NodeId>,
        target_input: impl Into<String>,
    ) -> Self {
        Self {
            source_node: source_node.into(),
            source_output: source_output.into(),
            target_node: target_node.into(),
            target_input: target_input.into(),
        }
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{}",
            self.source_node, self.source_output, self.target_node, self.target_input
        )
    }
}

/// Serializable workflow, rehydrated into a [`Workflow`] through the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub nodes: Vec<NodeDefinition>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_node(&mut self, node: NodeDefinition) -> NodeId {
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn connect(
        &mut self,
        source_node: impl Into<NodeId>,
        source_output: impl Into<String>,
        target_node: impl Into<NodeId>,
        target_input: impl Into<String>,
    ) {
        self.connections.push(Connection::new(
            source_node,
            source_output,
            target_node,
            target_input,
        ));
    }
}

/// Node entry of a [`WorkflowDefinition`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDefinition {
    pub id: NodeId,
    pub label: String,
    pub activity_type: String,
    /// Constructor parameters, including `input_params`/`output_params`
    /// schemas for customizable activity types
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl NodeDefinition {
    pub fn new(
        id: impl Into<NodeId>,
        activity_type: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            activity_type: activity_type.into(),
            params: serde_json::Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Inputs addressed per root node
pub type WorkflowInputs = HashMap<NodeId, crate::ValueMap>;
