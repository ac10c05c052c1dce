//! Workflow graph validation and ordering
//!
//! [`validate`] runs the structural and type checks in a fixed order and the
//! first failing check is reported. [`DependencyGraph`] is the index-based
//! adjacency used for Kahn ordering and by the executor's scheduler.

use crate::{Connection, NodeId, ParamDirection, WorkflowError, WorkflowNode};
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Root and leaf node ids of a validated workflow
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    /// Nodes with no incoming connection; fed by caller inputs
    pub roots: BTreeSet<NodeId>,
    /// Nodes with no outgoing connection; their outputs are returned
    pub leaves: BTreeSet<NodeId>,
}

impl Topology {
    pub fn compute(nodes: &[WorkflowNode], connections: &[Connection]) -> Self {
        let targets: HashSet<&str> = connections.iter().map(|c| c.target_node.as_str()).collect();
        let sources: HashSet<&str> = connections.iter().map(|c| c.source_node.as_str()).collect();

        let mut roots: BTreeSet<NodeId> = nodes
            .iter()
            .filter(|n| !targets.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();
        let mut leaves: BTreeSet<NodeId> = nodes
            .iter()
            .filter(|n| !sources.contains(n.id.as_str()))
            .map(|n| n.id.clone())
            .collect();

        if let [only] = nodes {
            roots.insert(only.id.clone());
            leaves.insert(only.id.clone());
        }

        Self { roots, leaves }
    }

    pub fn is_root(&self, id: &str) -> bool {
        self.roots.contains(id)
    }

    pub fn is_leaf(&self, id: &str) -> bool {
        self.leaves.contains(id)
    }
}

/// Validate a node set and its connections.
///
/// Pure: the same graph always yields the same outcome.
pub fn validate(
    nodes: &[WorkflowNode],
    connections: &[Connection],
) -> Result<Topology, WorkflowError> {
    check_unique_labels(nodes)?;

    if nodes.len() > 1 && connections.is_empty() {
        return Err(WorkflowError::NoConnectionsAmongMultipleNodes);
    }

    check_single_writer(connections)?;

    if has_cycle(nodes, connections) {
        return Err(WorkflowError::CyclicDependency);
    }

    for connection in connections {
        check_connection(nodes, connection)?;
    }

    let topology = Topology::compute(nodes, connections);

    check_inputs_connected(nodes, connections, &topology)?;
    check_outputs_connected(nodes, connections, &topology)?;
    check_all_participate(nodes, connections)?;

    tracing::debug!(
        roots = ?topology.roots,
        leaves = ?topology.leaves,
        "Workflow validated: {} nodes, {} connections",
        nodes.len(),
        connections.len()
    );

    Ok(topology)
}

/// Endpoint, parameter and kind checks for a single connection
pub(crate) fn check_connection(
    nodes: &[WorkflowNode],
    connection: &Connection,
) -> Result<(), WorkflowError> {
    let source = find(nodes, &connection.source_node)?;
    let target = find(nodes, &connection.target_node)?;

    let source_param = source
        .params(ParamDirection::Output)
        .get(&connection.source_output)
        .ok_or_else(|| WorkflowError::ParameterNotFound {
            node: connection.source_node.clone(),
            param: connection.source_output.clone(),
            direction: ParamDirection::Output,
        })?;
    let target_param = target
        .params(ParamDirection::Input)
        .get(&connection.target_input)
        .ok_or_else(|| WorkflowError::ParameterNotFound {
            node: connection.target_node.clone(),
            param: connection.target_input.clone(),
            direction: ParamDirection::Input,
        })?;

    // top-level tag only; nested items/properties are not compared
    if source_param.kind() != target_param.kind() {
        return Err(WorkflowError::TypeMismatch {
            source_node: connection.source_node.clone(),
            source_output: connection.source_output.clone(),
            source_kind: source_param.kind().to_string(),
            target_node: connection.target_node.clone(),
            target_input: connection.target_input.clone(),
            target_kind: target_param.kind().to_string(),
        });
    }

    Ok(())
}

/// Kahn ordering over `nodes`; ties go to insertion order.
pub fn topological_order(
    nodes: &[WorkflowNode],
    connections: &[Connection],
) -> Result<Vec<NodeId>, WorkflowError> {
    let graph = DependencyGraph::build(nodes, connections)?;
    let order = graph.topological_order()?;
    Ok(order.into_iter().map(|i| nodes[i].id.clone()).collect())
}

fn find<'a>(nodes: &'a [WorkflowNode], id: &str) -> Result<&'a WorkflowNode, WorkflowError> {
    nodes
        .iter()
        .find(|n| n.id == id)
        .ok_or_else(|| WorkflowError::NodeNotFound(id.to_string()))
}

fn check_unique_labels(nodes: &[WorkflowNode]) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.label.as_str()) {
            return Err(WorkflowError::DuplicateNodeLabel(node.label.clone()));
        }
    }
    Ok(())
}

fn check_single_writer(connections: &[Connection]) -> Result<(), WorkflowError> {
    let mut seen = HashSet::new();
    for conn in connections {
        if !seen.insert((conn.target_node.as_str(), conn.target_input.as_str())) {
            return Err(WorkflowError::MultipleConnectionsToInput {
                node: conn.target_node.clone(),
                param: conn.target_input.clone(),
            });
        }
    }
    Ok(())
}

/// Depth-first back-edge search. Endpoints that are not declared nodes
/// still take part; they are reported later as missing.
fn has_cycle(nodes: &[WorkflowNode], connections: &[Connection]) -> bool {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for node in nodes {
        graph.add_node(node.id.as_str());
    }
    for conn in connections {
        graph.add_edge(conn.source_node.as_str(), conn.target_node.as_str(), ());
    }
    is_cyclic_directed(&graph)
}

fn check_inputs_connected(
    nodes: &[WorkflowNode],
    connections: &[Connection],
    topology: &Topology,
) -> Result<(), WorkflowError> {
    let connected: HashSet<(&str, &str)> = connections
        .iter()
        .map(|c| (c.target_node.as_str(), c.target_input.as_str()))
        .collect();

    for node in nodes.iter().filter(|n| !topology.is_root(&n.id)) {
        for param in node.params(ParamDirection::Input).keys() {
            if !connected.contains(&(node.id.as_str(), param.as_str())) {
                return Err(WorkflowError::UnconnectedInput {
                    node: node.id.clone(),
                    param: param.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_outputs_connected(
    nodes: &[WorkflowNode],
    connections: &[Connection],
    topology: &Topology,
) -> Result<(), WorkflowError> {
    let connected: HashSet<(&str, &str)> = connections
        .iter()
        .map(|c| (c.source_node.as_str(), c.source_output.as_str()))
        .collect();

    for node in nodes.iter().filter(|n| !topology.is_leaf(&n.id)) {
        for param in node.params(ParamDirection::Output).keys() {
            if !connected.contains(&(node.id.as_str(), param.as_str())) {
                return Err(WorkflowError::UnconnectedOutput {
                    node: node.id.clone(),
                    param: param.clone(),
                });
            }
        }
    }
    Ok(())
}

fn check_all_participate(
    nodes: &[WorkflowNode],
    connections: &[Connection],
) -> Result<(), WorkflowError> {
    if nodes.len() <= 1 {
        return Ok(());
    }

    let connected: HashSet<&str> = connections
        .iter()
        .flat_map(|c| [c.source_node.as_str(), c.target_node.as_str()])
        .collect();
    let disconnected: Vec<NodeId> = nodes
        .iter()
        .filter(|n| !connected.contains(n.id.as_str()))
        .map(|n| n.id.clone())
        .collect();

    if disconnected.is_empty() {
        Ok(())
    } else {
        Err(WorkflowError::DisconnectedNodes(disconnected))
    }
}

/// Arena view of a workflow: node positions, successor lists, in-degrees.
///
/// One successor entry and one in-degree unit exist per connection, so
/// two connections between the same pair of nodes count twice.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    successors: Vec<Vec<usize>>,
    in_degree: Vec<usize>,
}

impl DependencyGraph {
    pub fn build(
        nodes: &[WorkflowNode],
        connections: &[Connection],
    ) -> Result<Self, WorkflowError> {
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();

        let mut successors = vec![Vec::new(); nodes.len()];
        let mut in_degree = vec![0; nodes.len()];

        for conn in connections {
            let source = *index
                .get(conn.source_node.as_str())
                .ok_or_else(|| WorkflowError::NodeNotFound(conn.source_node.clone()))?;
            let target = *index
                .get(conn.target_node.as_str())
                .ok_or_else(|| WorkflowError::NodeNotFound(conn.target_node.clone()))?;
            successors[source].push(target);
            in_degree[target] += 1;
        }

        Ok(Self {
            successors,
            in_degree,
        })
    }

    pub fn len(&self) -> usize {
        self.in_degree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_degree.is_empty()
    }

    /// Per-node count of incoming connections
    pub fn in_degrees(&self) -> Vec<usize> {
        self.in_degree.clone()
    }

    pub fn successors(&self, node: usize) -> &[usize] {
        &self.successors[node]
    }

    /// Node positions with no incoming connection, in insertion order
    pub fn initially_ready(&self) -> VecDeque<usize> {
        (0..self.len()).filter(|&i| self.in_degree[i] == 0).collect()
    }

    pub fn topological_order(&self) -> Result<Vec<usize>, WorkflowError> {
        let mut in_degree = self.in_degrees();
        let mut queue = self.initially_ready();
        let mut order = Vec::with_capacity(self.len());

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for &next in &self.successors[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != self.len() {
            return Err(WorkflowError::CyclicDependency);
        }
        Ok(order)
    }
}
