use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use weavecore::{
    param_map, parse_param_map, Activity, ActivityError, ParamMap, Parameter, RegistryError,
    Value, ValueMap,
};

const INPUT_PARAMS: &str = "input_params";
const OUTPUT_PARAMS: &str = "output_params";

/// Whether instances of an activity type share one schema or bring their own
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityKind {
    /// Every instance has exactly this interface
    Fixed {
        input_params: ParamMap,
        output_params: ParamMap,
    },
    /// Each instance supplies `input_params`/`output_params` at creation
    Customizable,
}

impl ActivityKind {
    pub fn fixed<I, O>(inputs: I, outputs: O) -> Self
    where
        I: IntoIterator<Item = Parameter>,
        O: IntoIterator<Item = Parameter>,
    {
        ActivityKind::Fixed {
            input_params: param_map(inputs),
            output_params: param_map(outputs),
        }
    }

    pub fn allows_custom_params(&self) -> bool {
        matches!(self, ActivityKind::Customizable)
    }
}

/// Validated constructor arguments handed to a factory
#[derive(Debug, Clone, Default)]
pub struct ActivityParams {
    pub values: ValueMap,
    pub input_params: Option<ParamMap>,
    pub output_params: Option<ParamMap>,
}

impl ActivityParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_schema(mut self, input_params: ParamMap, output_params: ParamMap) -> Self {
        self.input_params = Some(input_params);
        self.output_params = Some(output_params);
        self
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    /// Get a required string parameter or return error
    pub fn require_str(&self, name: &str) -> Result<&str, ActivityError> {
        self.get_str(name)
            .ok_or_else(|| ActivityError::Configuration(format!("Missing parameter: {}", name)))
    }

    pub fn require_f64(&self, name: &str) -> Result<f64, ActivityError> {
        self.get_f64(name)
            .ok_or_else(|| ActivityError::Configuration(format!("Missing parameter: {}", name)))
    }

    pub fn activity_name(&self) -> Result<&str, ActivityError> {
        self.require_str("activity_name")
    }

    /// Both custom schemas, as required by customizable activity types
    pub fn custom_schema(&self) -> Result<(ParamMap, ParamMap), ActivityError> {
        match (&self.input_params, &self.output_params) {
            (Some(inputs), Some(outputs)) => Ok((inputs.clone(), outputs.clone())),
            _ => Err(ActivityError::Configuration(
                "input_params and output_params are required".to_string(),
            )),
        }
    }
}

/// Factory trait for creating activity instances
pub trait ActivityFactory: Send + Sync {
    /// Registered type name
    fn activity_type(&self) -> &str;

    fn description(&self) -> &str;

    /// Parameters required to instantiate the activity
    fn required_params(&self) -> ParamMap {
        param_map([Parameter::string("activity_name")])
    }

    fn kind(&self) -> ActivityKind;

    /// Create a new instance from already validated parameters
    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError>;
}

/// Public metadata about a registered activity type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityTypeInfo {
    pub activity_type: String,
    pub description: String,
    /// Fixed input schema, `None` when customizable
    pub input_params: Option<ParamMap>,
    /// Fixed output schema, `None` when customizable
    pub output_params: Option<ParamMap>,
    pub required_params: ParamMap,
    pub allow_custom_params: bool,
}

/// Registry of available activity types
///
/// Populate it at startup, then share it read-only (e.g. behind an `Arc`).
pub struct ActivityRegistry {
    factories: HashMap<String, Arc<dyn ActivityFactory>>,
}

impl ActivityRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register an activity factory
    pub fn register(&mut self, factory: Arc<dyn ActivityFactory>) -> Result<(), RegistryError> {
        let activity_type = factory.activity_type().to_string();
        if self.factories.contains_key(&activity_type) {
            return Err(RegistryError::DuplicateActivityType(activity_type));
        }
        tracing::info!("Registering activity type: {}", activity_type);
        self.factories.insert(activity_type, factory);
        Ok(())
    }

    /// Create an activity from a stored `{activity_type, params}` pair.
    ///
    /// `params` may carry `input_params` / `output_params` schema maps;
    /// every other entry is a constructor value.
    pub fn create_activity(
        &self,
        activity_type: &str,
        params: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Arc<dyn Activity>, RegistryError> {
        let factory = self.factory(activity_type)?;

        let values: ValueMap = params
            .iter()
            .filter(|(key, _)| key.as_str() != INPUT_PARAMS && key.as_str() != OUTPUT_PARAMS)
            .map(|(key, value)| (key.clone(), Value::from(value.clone())))
            .collect();
        check_required(&factory.required_params(), &values)?;

        let has_custom = params.contains_key(INPUT_PARAMS) || params.contains_key(OUTPUT_PARAMS);
        if has_custom && !factory.kind().allows_custom_params() {
            return Err(RegistryError::CustomParamsNotAllowed(
                activity_type.to_string(),
            ));
        }

        let activity_params = ActivityParams {
            values,
            input_params: params.get(INPUT_PARAMS).map(parse_param_map).transpose()?,
            output_params: params.get(OUTPUT_PARAMS).map(parse_param_map).transpose()?,
        };
        self.construct(factory.as_ref(), activity_params)
    }

    /// Typed counterpart of [`create_activity`](Self::create_activity)
    pub fn create_with(
        &self,
        activity_type: &str,
        params: ActivityParams,
    ) -> Result<Arc<dyn Activity>, RegistryError> {
        let factory = self.factory(activity_type)?;
        check_required(&factory.required_params(), &params.values)?;

        let has_custom = params.input_params.is_some() || params.output_params.is_some();
        if has_custom && !factory.kind().allows_custom_params() {
            return Err(RegistryError::CustomParamsNotAllowed(
                activity_type.to_string(),
            ));
        }
        self.construct(factory.as_ref(), params)
    }

    /// Get all registered activity type names, sorted
    pub fn list_activity_types(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Metadata for every registered type, sorted by name
    pub fn activity_types(&self) -> Vec<ActivityTypeInfo> {
        self.list_activity_types()
            .iter()
            .filter_map(|name| self.get_info(name))
            .collect()
    }

    pub fn get_info(&self, activity_type: &str) -> Option<ActivityTypeInfo> {
        self.factories.get(activity_type).map(|factory| {
            let kind = factory.kind();
            let allow_custom_params = kind.allows_custom_params();
            let (input_params, output_params) = match kind {
                ActivityKind::Fixed {
                    input_params,
                    output_params,
                } => (Some(input_params), Some(output_params)),
                ActivityKind::Customizable => (None, None),
            };
            ActivityTypeInfo {
                activity_type: activity_type.to_string(),
                description: factory.description().to_string(),
                allow_custom_params,
                input_params,
                output_params,
                required_params: factory.required_params(),
            }
        })
    }

    pub fn contains(&self, activity_type: &str) -> bool {
        self.factories.contains_key(activity_type)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    fn factory(&self, activity_type: &str) -> Result<&Arc<dyn ActivityFactory>, RegistryError> {
        self.factories
            .get(activity_type)
            .ok_or_else(|| RegistryError::UnknownActivityType(activity_type.to_string()))
    }

    fn construct(
        &self,
        factory: &dyn ActivityFactory,
        params: ActivityParams,
    ) -> Result<Arc<dyn Activity>, RegistryError> {
        let activity_type = factory.activity_type();
        let activity = factory
            .create(params)
            .map_err(|source| RegistryError::Construction {
                activity_type: activity_type.to_string(),
                source,
            })?;

        if let ActivityKind::Fixed {
            input_params,
            output_params,
        } = factory.kind()
        {
            let descriptor = activity.descriptor();
            if descriptor.input_params != input_params || descriptor.output_params != output_params
            {
                tracing::error!(
                    "Activity type {} built an instance with a foreign schema",
                    activity_type
                );
                return Err(RegistryError::Construction {
                    activity_type: activity_type.to_string(),
                    source: ActivityError::Configuration(
                        "instance schema differs from the registered fixed schema".to_string(),
                    ),
                });
            }
        }

        tracing::debug!(
            "Created {} activity '{}' ({})",
            activity_type,
            activity.descriptor().activity_name,
            activity.descriptor().id
        );
        Ok(activity)
    }
}

impl Default for ActivityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn check_required(required: &ParamMap, values: &ValueMap) -> Result<(), RegistryError> {
    for (name, param) in required {
        let value = values
            .get(name)
            .ok_or_else(|| RegistryError::MissingRequiredParameter(name.clone()))?;
        if !param.validate_value(value) {
            return Err(RegistryError::InvalidRequiredParameterValue {
                name: name.clone(),
                expected: param.describe(),
                actual: value.type_name().to_string(),
            });
        }
    }
    Ok(())
}
