use async_trait::async_trait;
use std::sync::Arc;
use weavecore::{Activity, ActivityDescriptor, ActivityError, ValueMap};
use weaveruntime::{ActivityFactory, ActivityKind, ActivityParams};

/// Passes its inputs straight through.
///
/// Input and output schemas are identical, so validated inputs are already
/// valid outputs.
pub struct IdentityActivity {
    descriptor: ActivityDescriptor,
}

impl IdentityActivity {
    pub fn new(params: &ActivityParams) -> Result<Self, ActivityError> {
        let (input_params, output_params) = params.custom_schema()?;
        if input_params != output_params {
            return Err(ActivityError::Configuration(
                "Input and output parameters must have identical structure".to_string(),
            ));
        }
        Ok(Self {
            descriptor: ActivityDescriptor::new(
                params.activity_name()?,
                input_params,
                output_params,
            ),
        })
    }
}

#[async_trait]
impl Activity for IdentityActivity {
    fn activity_type(&self) -> &str {
        "identity_activity"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        Ok(inputs)
    }
}

pub struct IdentityFactory;

impl ActivityFactory for IdentityFactory {
    fn activity_type(&self) -> &str {
        "identity_activity"
    }

    fn description(&self) -> &str {
        "Passes input values directly to output with the same parameter structure"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::Customizable
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        Ok(Arc::new(IdentityActivity::new(&params)?))
    }
}
