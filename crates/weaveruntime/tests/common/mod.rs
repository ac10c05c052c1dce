#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use weavecore::{
    param_map, Activity, ActivityDescriptor, ActivityError, Parameter, Value, ValueMap,
};
use weaveruntime::{ActivityFactory, ActivityKind, ActivityParams, ActivityRegistry};

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Shared log of invocation order
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, name: &str) {
        self.0.lock().unwrap().push(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Appends `suffix` to each string input and emits the result on `out`.
/// Inputs are joined in name order.
pub struct AppendActivity {
    descriptor: ActivityDescriptor,
    suffix: String,
    log: CallLog,
    delay: Duration,
}

impl AppendActivity {
    pub fn new(name: &str, inputs: &[&str], log: &CallLog) -> Arc<dyn Activity> {
        Self::with_delay(name, inputs, log, Duration::ZERO)
    }

    pub fn with_delay(
        name: &str,
        inputs: &[&str],
        log: &CallLog,
        delay: Duration,
    ) -> Arc<dyn Activity> {
        Arc::new(Self {
            descriptor: ActivityDescriptor::new(
                name,
                param_map(inputs.iter().map(|i| Parameter::string(*i))),
                param_map([Parameter::string("out")]),
            ),
            suffix: name.to_string(),
            log: log.clone(),
            delay,
        })
    }
}

#[async_trait]
impl Activity for AppendActivity {
    fn activity_type(&self) -> &str {
        "test.append"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.log.record(&self.suffix);

        let mut keys: Vec<&String> = inputs.keys().collect();
        keys.sort();
        let joined: String = keys
            .into_iter()
            .filter_map(|k| inputs[k].as_str())
            .collect();

        Ok(HashMap::from([(
            "out".to_string(),
            Value::String(format!("{}{}", joined, self.suffix)),
        )]))
    }
}

/// Always fails with `ExecutionFailed`
pub struct FailingActivity {
    descriptor: ActivityDescriptor,
    pub calls: Arc<AtomicUsize>,
}

impl FailingActivity {
    pub fn new(calls: Arc<AtomicUsize>) -> Arc<dyn Activity> {
        Arc::new(Self {
            descriptor: ActivityDescriptor::new(
                "failing",
                param_map([Parameter::string("in")]),
                param_map([Parameter::string("out")]),
            ),
            calls,
        })
    }
}

#[async_trait]
impl Activity for FailingActivity {
    fn activity_type(&self) -> &str {
        "test.failing"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, _inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ActivityError::ExecutionFailed("remote service unavailable".to_string()))
    }
}

/// Panics instead of returning
pub struct PanickingActivity {
    descriptor: ActivityDescriptor,
}

impl PanickingActivity {
    pub fn new() -> Arc<dyn Activity> {
        Arc::new(Self {
            descriptor: ActivityDescriptor::new(
                "panicking",
                param_map([Parameter::string("in")]),
                param_map([Parameter::string("out")]),
            ),
        })
    }
}

#[async_trait]
impl Activity for PanickingActivity {
    fn activity_type(&self) -> &str {
        "test.panicking"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, _inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        panic!("boom");
    }
}

/// Greeting activity with a customizable schema
pub struct GreetingActivity {
    descriptor: ActivityDescriptor,
}

#[async_trait]
impl Activity for GreetingActivity {
    fn activity_type(&self) -> &str {
        "custom_params"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let name = inputs.get("name").and_then(Value::as_str).unwrap_or("stranger");
        Ok(HashMap::from([(
            "greeting".to_string(),
            Value::String(format!("Hello, {}!", name)),
        )]))
    }
}

pub struct GreetingFactory;

impl ActivityFactory for GreetingFactory {
    fn activity_type(&self) -> &str {
        "custom_params"
    }

    fn description(&self) -> &str {
        "Activity with customizable parameters"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::Customizable
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        let (input_params, output_params) = params.custom_schema()?;
        Ok(Arc::new(GreetingActivity {
            descriptor: ActivityDescriptor::new(
                params.activity_name()?,
                input_params,
                output_params,
            ),
        }))
    }
}

/// Fixed-schema string length activity
pub struct LengthActivity {
    descriptor: ActivityDescriptor,
}

#[async_trait]
impl Activity for LengthActivity {
    fn activity_type(&self) -> &str {
        "string_length"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let text = inputs.get("text").and_then(Value::as_str).unwrap_or_default();
        Ok(HashMap::from([(
            "length".to_string(),
            Value::from(text.chars().count()),
        )]))
    }
}

pub struct LengthFactory;

impl LengthFactory {
    fn schema() -> ActivityKind {
        ActivityKind::fixed([Parameter::string("text")], [Parameter::integer("length")])
    }
}

impl ActivityFactory for LengthFactory {
    fn activity_type(&self) -> &str {
        "string_length"
    }

    fn description(&self) -> &str {
        "Calculates the length of a string"
    }

    fn kind(&self) -> ActivityKind {
        Self::schema()
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        let ActivityKind::Fixed {
            input_params,
            output_params,
        } = Self::schema()
        else {
            unreachable!("fixed schema");
        };
        Ok(Arc::new(LengthActivity {
            descriptor: ActivityDescriptor::new(
                params.activity_name()?,
                input_params,
                output_params,
            ),
        }))
    }
}

/// Factory that claims a fixed schema but builds something else
pub struct DriftingFactory;

impl ActivityFactory for DriftingFactory {
    fn activity_type(&self) -> &str {
        "drifting"
    }

    fn description(&self) -> &str {
        "Builds instances that do not match its declared schema"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::fixed([Parameter::string("text")], [Parameter::integer("length")])
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        Ok(Arc::new(LengthActivity {
            descriptor: ActivityDescriptor::new(
                params.activity_name()?,
                param_map([Parameter::number("text")]),
                param_map([Parameter::integer("length")]),
            ),
        }))
    }
}

pub fn test_registry() -> ActivityRegistry {
    let mut registry = ActivityRegistry::new();
    registry.register(Arc::new(GreetingFactory)).unwrap();
    registry.register(Arc::new(LengthFactory)).unwrap();
    registry.register(Arc::new(DriftingFactory)).unwrap();
    registry
}
