#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use weavecore::{
    param_map, Activity, ActivityDescriptor, ActivityError, Parameter, ValueMap, Workflow,
};

type RunFn = dyn Fn(ValueMap) -> Result<ValueMap, ActivityError> + Send + Sync;

/// Test activity whose computation is a closure
pub struct FnActivity {
    descriptor: ActivityDescriptor,
    run: Box<RunFn>,
}

impl FnActivity {
    pub fn new(
        name: &str,
        inputs: Vec<Parameter>,
        outputs: Vec<Parameter>,
        run: impl Fn(ValueMap) -> Result<ValueMap, ActivityError> + Send + Sync + 'static,
    ) -> Arc<dyn Activity> {
        Arc::new(Self {
            descriptor: ActivityDescriptor::new(name, param_map(inputs), param_map(outputs)),
            run: Box::new(run),
        })
    }

    /// Activity that never gets run; only its schema matters
    pub fn schema(inputs: Vec<Parameter>, outputs: Vec<Parameter>) -> Arc<dyn Activity> {
        Self::new("schema_only", inputs, outputs, |_| Ok(ValueMap::new()))
    }
}

#[async_trait]
impl Activity for FnActivity {
    fn activity_type(&self) -> &str {
        "test.fn"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        (self.run)(inputs)
    }
}

/// string `input1` -> string `output1`
pub fn passthrough() -> Arc<dyn Activity> {
    FnActivity::schema(
        vec![Parameter::string("input1")],
        vec![Parameter::string("output1")],
    )
}

/// Workflow of `passthrough` nodes labelled after their ids
pub fn workflow_of(ids: &[&str]) -> Workflow {
    let mut workflow = Workflow::new();
    for id in ids {
        workflow
            .add_node(*id, passthrough(), format!("Node {}", id))
            .expect("unique node id");
    }
    workflow
}
