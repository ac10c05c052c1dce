use crate::fixed_descriptor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use weavecore::{Activity, ActivityDescriptor, ActivityError, Parameter, Value, ValueMap};
use weaveruntime::{ActivityFactory, ActivityKind, ActivityParams};

fn text_input(inputs: &ValueMap, name: &str) -> Result<String, ActivityError> {
    inputs
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ActivityError::MissingInputParameter(name.to_string()))
}

/// Converts text to uppercase
pub struct UppercaseActivity {
    descriptor: ActivityDescriptor,
}

#[async_trait]
impl Activity for UppercaseActivity {
    fn activity_type(&self) -> &str {
        "uppercase"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let text = text_input(&inputs, "text")?;
        Ok(HashMap::from([(
            "uppercase_text".to_string(),
            Value::String(text.to_uppercase()),
        )]))
    }
}

pub struct UppercaseFactory;

impl ActivityFactory for UppercaseFactory {
    fn activity_type(&self) -> &str {
        "uppercase"
    }

    fn description(&self) -> &str {
        "Converts text to uppercase"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::fixed(
            [Parameter::string("text")],
            [Parameter::string("uppercase_text")],
        )
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        Ok(Arc::new(UppercaseActivity {
            descriptor: fixed_descriptor(self.kind(), &params)?,
        }))
    }
}

/// Counts the characters of a string
pub struct StringLengthActivity {
    descriptor: ActivityDescriptor,
}

#[async_trait]
impl Activity for StringLengthActivity {
    fn activity_type(&self) -> &str {
        "string_length"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let text = text_input(&inputs, "text")?;
        Ok(HashMap::from([(
            "length".to_string(),
            Value::from(text.chars().count()),
        )]))
    }
}

pub struct StringLengthFactory;

impl ActivityFactory for StringLengthFactory {
    fn activity_type(&self) -> &str {
        "string_length"
    }

    fn description(&self) -> &str {
        "Calculates the length of a string"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::fixed([Parameter::string("text")], [Parameter::integer("length")])
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        Ok(Arc::new(StringLengthActivity {
            descriptor: fixed_descriptor(self.kind(), &params)?,
        }))
    }
}

/// Joins two strings
pub struct ConcatActivity {
    descriptor: ActivityDescriptor,
}

#[async_trait]
impl Activity for ConcatActivity {
    fn activity_type(&self) -> &str {
        "concat"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let first = text_input(&inputs, "text1")?;
        let second = text_input(&inputs, "text2")?;
        Ok(HashMap::from([(
            "concatenated".to_string(),
            Value::String(first + &second),
        )]))
    }
}

pub struct ConcatFactory;

impl ActivityFactory for ConcatFactory {
    fn activity_type(&self) -> &str {
        "concat"
    }

    fn description(&self) -> &str {
        "Concatenates two strings"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::fixed(
            [Parameter::string("text1"), Parameter::string("text2")],
            [Parameter::string("concatenated")],
        )
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        Ok(Arc::new(ConcatActivity {
            descriptor: fixed_descriptor(self.kind(), &params)?,
        }))
    }
}
