use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{JoinError, JoinSet};
use weavecore::{
    Activity, ActivityError, DependencyGraph, EventBus, ExecutionEvent, ExecutionId, FlowError,
    NodeId, ValueMap, Workflow, WorkflowError, WorkflowInputs, WorkflowNode,
};

/// Executes workflows as DAGs with bounded parallelism
///
/// A node becomes runnable once every upstream producer has finished.
/// Ready nodes start in Kahn order; with `max_parallel == 1` nodes run one
/// at a time in exactly that order. Running activities are owned by the
/// call: dropping the `execute` future aborts them.
pub struct WorkflowExecutor {
    max_parallel: usize,
}

impl WorkflowExecutor {
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Validate and execute a workflow, returning the outputs of its leaves
    pub async fn execute(
        &self,
        workflow: &Workflow,
        event_bus: &EventBus,
        inputs: WorkflowInputs,
    ) -> Result<ExecutionResult, FlowError> {
        let execution_id = ExecutionId::new_v4();
        let start_time = Instant::now();

        event_bus.emit(ExecutionEvent::WorkflowStarted {
            execution_id,
            node_count: workflow.nodes.len(),
            timestamp: Utc::now(),
        });

        tracing::info!(
            "Starting workflow execution {} ({} nodes)",
            execution_id,
            workflow.nodes.len()
        );

        let result = self
            .execute_dag(workflow, event_bus, execution_id, inputs)
            .await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let success = result.is_ok();

        event_bus.emit(ExecutionEvent::WorkflowCompleted {
            execution_id,
            success,
            duration_ms,
            timestamp: Utc::now(),
        });

        if success {
            tracing::info!("Workflow execution {} finished in {}ms", execution_id, duration_ms);
        }

        result
    }

    async fn execute_dag(
        &self,
        workflow: &Workflow,
        event_bus: &EventBus,
        execution_id: ExecutionId,
        inputs: WorkflowInputs,
    ) -> Result<ExecutionResult, FlowError> {
        // Structural problems surface before anything runs
        let topology = workflow.validate()?;
        let graph = DependencyGraph::build(&workflow.nodes, &workflow.connections)?;

        for node_id in inputs.keys() {
            if workflow.find_node(node_id).is_none() {
                tracing::warn!("Ignoring inputs for unknown node {}", node_id);
            }
        }

        let mut in_degree = graph.in_degrees();
        let mut ready = graph.initially_ready();
        let mut node_outputs: HashMap<NodeId, ValueMap> = HashMap::new();
        let mut running = JoinSet::new();
        let mut task_nodes: HashMap<tokio::task::Id, usize> = HashMap::new();
        let mut completed = 0;

        loop {
            while running.len() < self.max_parallel {
                let Some(index) = ready.pop_front() else {
                    break;
                };
                let node = &workflow.nodes[index];
                let activity_inputs = collect_node_inputs(workflow, node, &inputs, &node_outputs)?;

                event_bus.emit(ExecutionEvent::NodeStarted {
                    execution_id,
                    node_id: node.id.clone(),
                    activity_type: node.activity.activity_type().to_string(),
                    timestamp: Utc::now(),
                });
                tracing::debug!("Starting node {} ({})", node.id, node.label);

                let activity = Arc::clone(&node.activity);
                let handle = running.spawn(async move {
                    let start = Instant::now();
                    let result = activity.invoke(activity_inputs).await;
                    (index, result, start.elapsed().as_millis() as u64)
                });
                task_nodes.insert(handle.id(), index);
            }

            // Nothing running and nothing ready: done
            let Some(joined) = running.join_next().await else {
                break;
            };

            let (index, result, duration_ms) = match joined {
                Ok(finished) => finished,
                Err(e) => match task_nodes.get(&e.id()) {
                    Some(&index) => (index, Err(join_failure(e)), 0),
                    None => {
                        running.abort_all();
                        return Err(FlowError::Execution(format!("Task join error: {}", e)));
                    }
                },
            };
            let node_id = &workflow.nodes[index].id;

            match result {
                Ok(outputs) => {
                    tracing::info!("Node {} completed in {}ms", node_id, duration_ms);

                    event_bus.emit(ExecutionEvent::NodeCompleted {
                        execution_id,
                        node_id: node_id.clone(),
                        outputs: outputs.clone(),
                        duration_ms,
                        timestamp: Utc::now(),
                    });

                    node_outputs.insert(node_id.clone(), outputs);
                    completed += 1;

                    for &next in graph.successors(index) {
                        in_degree[next] -= 1;
                        if in_degree[next] == 0 {
                            ready.push_back(next);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("Node {} failed: {}", node_id, e);

                    event_bus.emit(ExecutionEvent::NodeFailed {
                        execution_id,
                        node_id: node_id.clone(),
                        error: e.to_string(),
                        timestamp: Utc::now(),
                    });

                    running.abort_all();
                    return Err(FlowError::Activity {
                        node_id: node_id.clone(),
                        source: e,
                    });
                }
            }
        }

        if completed != graph.len() {
            return Err(WorkflowError::CyclicDependency.into());
        }

        let outputs = topology
            .leaves
            .iter()
            .filter_map(|id| node_outputs.remove_entry(id))
            .collect();

        Ok(ExecutionResult {
            execution_id,
            outputs,
            completed_nodes: completed,
            total_nodes: workflow.nodes.len(),
        })
    }
}

impl Default for WorkflowExecutor {
    fn default() -> Self {
        Self::new(1)
    }
}

/// A task that ended without producing a result, as an activity failure
fn join_failure(error: JoinError) -> ActivityError {
    if error.is_panic() {
        let payload = error.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        ActivityError::ExecutionFailed(format!("activity panicked: {}", message))
    } else {
        ActivityError::ExecutionFailed("activity task was cancelled".to_string())
    }
}

/// Caller-supplied values for the node, overlaid with values arriving over
/// its incoming connections.
fn collect_node_inputs(
    workflow: &Workflow,
    node: &WorkflowNode,
    inputs: &WorkflowInputs,
    node_outputs: &HashMap<NodeId, ValueMap>,
) -> Result<ValueMap, FlowError> {
    let mut activity_inputs = inputs.get(&node.id).cloned().unwrap_or_default();

    for conn in workflow.connections.iter().filter(|c| c.target_node == node.id) {
        let value = node_outputs
            .get(&conn.source_node)
            .and_then(|outputs| outputs.get(&conn.source_output))
            .ok_or_else(|| {
                FlowError::Execution(format!("No value produced for connection {}", conn))
            })?;
        activity_inputs.insert(conn.target_input.clone(), value.clone());
    }

    Ok(activity_inputs)
}

/// Result of workflow execution
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub execution_id: ExecutionId,
    /// Outputs of leaf nodes only
    pub outputs: HashMap<NodeId, ValueMap>,
    pub completed_nodes: usize,
    pub total_nodes: usize,
}
