use crate::{registry::ActivityRegistry, ExecutionResult, WorkflowExecutor};
use std::sync::Arc;
use weavecore::{
    EventBus, ExecutionEvent, FlowError, Topology, Workflow, WorkflowDefinition, WorkflowInputs,
};

/// Main runtime: activity registry, executor and event bus
pub struct WeaveRuntime {
    registry: Arc<ActivityRegistry>,
    executor: Arc<WorkflowExecutor>,
    event_bus: Arc<EventBus>,
}

impl WeaveRuntime {
    /// Create a runtime with an empty registry and default settings
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_registry(Arc::new(ActivityRegistry::new()), config)
    }

    /// Create a runtime around a pre-populated registry
    pub fn with_registry(registry: Arc<ActivityRegistry>, config: RuntimeConfig) -> Self {
        let executor = Arc::new(WorkflowExecutor::new(config.max_parallel_nodes));
        let event_bus = Arc::new(EventBus::new(config.event_buffer_size));

        Self {
            registry,
            executor,
            event_bus,
        }
    }

    pub fn registry(&self) -> &Arc<ActivityRegistry> {
        &self.registry
    }

    /// Rehydrate a stored definition into a runnable workflow.
    ///
    /// Activities are created through the registry; each connection is
    /// checked as it is added.
    pub fn build(&self, definition: &WorkflowDefinition) -> Result<Workflow, FlowError> {
        let mut workflow = Workflow::new();

        for node in &definition.nodes {
            let activity = self
                .registry
                .create_activity(&node.activity_type, &node.params)?;
            workflow.add_node(node.id.clone(), activity, node.label.clone())?;
        }

        for conn in &definition.connections {
            workflow.connect(
                conn.source_node.clone(),
                conn.source_output.clone(),
                conn.target_node.clone(),
                conn.target_input.clone(),
            )?;
        }

        tracing::debug!(
            "Built workflow '{}' with {} nodes",
            definition.name,
            workflow.nodes.len()
        );
        Ok(workflow)
    }

    /// Build and fully validate a definition without running it
    pub fn validate(&self, definition: &WorkflowDefinition) -> Result<Topology, FlowError> {
        let workflow = self.build(definition)?;
        Ok(workflow.validate()?)
    }

    /// Execute a workflow directly
    pub async fn execute(
        &self,
        workflow: &Workflow,
        inputs: WorkflowInputs,
    ) -> Result<ExecutionResult, FlowError> {
        self.executor.execute(workflow, &self.event_bus, inputs).await
    }

    /// Build a definition and execute it
    pub async fn execute_definition(
        &self,
        definition: &WorkflowDefinition,
        inputs: WorkflowInputs,
    ) -> Result<ExecutionResult, FlowError> {
        let workflow = self.build(definition)?;
        self.execute(&workflow, inputs).await
    }

    /// Subscribe to execution events
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<ExecutionEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for WeaveRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Upper bound on activities running at the same time
    pub max_parallel_nodes: usize,
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_parallel_nodes: 10,
            event_buffer_size: 1000,
        }
    }
}
