use crate::{ActivityError, ParamMap, Parameter, Value, ValueMap};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type ActivityId = Uuid;

/// Core trait that all invocable activities implement
#[async_trait]
pub trait Activity: Send + Sync {
    /// Registered type name (e.g. "uppercase", "llm_activity")
    fn activity_type(&self) -> &str;

    /// Identity and declared interface of this instance
    fn descriptor(&self) -> &ActivityDescriptor;

    /// Activity-specific computation over already validated inputs
    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError>;

    /// Validate inputs, run once, validate outputs.
    async fn invoke(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let descriptor = self.descriptor();
        let inputs = descriptor.validate_inputs(inputs)?;
        let outputs = self.run(inputs).await?;
        descriptor.validate_outputs(outputs)
    }
}

/// Identity and input/output schema of an activity instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDescriptor {
    pub id: ActivityId,
    pub activity_name: String,
    pub input_params: ParamMap,
    pub output_params: ParamMap,
}

impl ActivityDescriptor {
    pub fn new(
        activity_name: impl Into<String>,
        input_params: ParamMap,
        output_params: ParamMap,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            activity_name: activity_name.into(),
            input_params,
            output_params,
        }
    }

    pub fn validate_inputs(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        check_values(&self.input_params, &inputs, Side::Input)?;
        Ok(inputs)
    }

    pub fn validate_outputs(&self, outputs: ValueMap) -> Result<ValueMap, ActivityError> {
        check_values(&self.output_params, &outputs, Side::Output)?;
        Ok(outputs)
    }
}

#[derive(Clone, Copy)]
enum Side {
    Input,
    Output,
}

/// Exact match of `values` against `params`: nothing missing, nothing extra,
/// every value of the declared type.
fn check_values(params: &ParamMap, values: &ValueMap, side: Side) -> Result<(), ActivityError> {
    if let Some(name) = params.keys().find(|name| !values.contains_key(*name)) {
        return Err(match side {
            Side::Input => ActivityError::MissingInputParameter(name.clone()),
            Side::Output => ActivityError::MissingOutputParameter(name.clone()),
        });
    }

    // smallest name first so the reported key does not depend on hash order
    if let Some(name) = values.keys().filter(|name| !params.contains_key(*name)).min() {
        return Err(match side {
            Side::Input => ActivityError::UnexpectedInputParameter(name.clone()),
            Side::Output => ActivityError::UnexpectedOutputParameter(name.clone()),
        });
    }

    for (name, param) in params {
        let value = &values[name];
        if !param.validate_value(value) {
            return Err(type_error(name, param, value, side));
        }
    }

    Ok(())
}

fn type_error(name: &str, param: &Parameter, value: &Value, side: Side) -> ActivityError {
    let name = name.to_string();
    let expected = param.describe();
    let actual = value.type_name().to_string();
    match side {
        Side::Input => ActivityError::InvalidInputType {
            name,
            expected,
            actual,
        },
        Side::Output => ActivityError::InvalidOutputType {
            name,
            expected,
            actual,
        },
    }
}
