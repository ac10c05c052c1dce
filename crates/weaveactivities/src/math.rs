use crate::fixed_descriptor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use weavecore::{Activity, ActivityDescriptor, ActivityError, Parameter, Value, ValueMap};
use weaveruntime::{ActivityFactory, ActivityKind, ActivityParams};

/// Adds two numbers
///
/// Two integers add exactly and stay integers; anything else is summed as
/// floating point.
pub struct AdderActivity {
    descriptor: ActivityDescriptor,
}

#[async_trait]
impl Activity for AdderActivity {
    fn activity_type(&self) -> &str {
        "adder_activity"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let operand = |name: &str| {
            inputs
                .get(name)
                .ok_or_else(|| ActivityError::MissingInputParameter(name.to_string()))
        };
        let (num1, num2) = (operand("num1")?, operand("num2")?);

        let sum = match (num1, num2) {
            (Value::Integer(a), Value::Integer(b)) => match a.checked_add(*b) {
                Some(total) => Value::Integer(total),
                None => Value::Number(*a as f64 + *b as f64),
            },
            _ => {
                let a = num1.as_f64().unwrap_or_default();
                let b = num2.as_f64().unwrap_or_default();
                Value::Number(a + b)
            }
        };

        Ok(HashMap::from([("sum".to_string(), sum)]))
    }
}

pub struct AdderFactory;

impl ActivityFactory for AdderFactory {
    fn activity_type(&self) -> &str {
        "adder_activity"
    }

    fn description(&self) -> &str {
        "Adds two numbers"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::fixed(
            [Parameter::number("num1"), Parameter::number("num2")],
            [Parameter::number("sum")],
        )
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        Ok(Arc::new(AdderActivity {
            descriptor: fixed_descriptor(self.kind(), &params)?,
        }))
    }
}
