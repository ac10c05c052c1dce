//! Standard activity library
//!
//! Collection of built-in activity types: text helpers, arithmetic, a
//! pass-through, a freight quote tool and an LLM-backed activity.

mod freight;
mod identity;
mod llm;
mod math;
mod text;

pub use freight::{build_quote_request, FreightQuoteActivity, FreightQuoteFactory};
pub use identity::{IdentityActivity, IdentityFactory};
pub use llm::{
    output_structure, parse_reply, CompletionBackend, LlmActivity, LlmActivityFactory, LlmConfig,
    OpenAiBackend, SUPPORTED_MODELS,
};
pub use math::{AdderActivity, AdderFactory};
pub use text::{
    ConcatActivity, ConcatFactory, StringLengthActivity, StringLengthFactory, UppercaseActivity,
    UppercaseFactory,
};

use std::sync::Arc;
use weavecore::{ActivityDescriptor, ActivityError, RegistryError};
use weaveruntime::{ActivityKind, ActivityParams, ActivityRegistry};

/// Register all standard activity types with a registry
pub fn register_all(registry: &mut ActivityRegistry) -> Result<(), RegistryError> {
    registry.register(Arc::new(text::UppercaseFactory))?;
    registry.register(Arc::new(text::StringLengthFactory))?;
    registry.register(Arc::new(text::ConcatFactory))?;
    registry.register(Arc::new(math::AdderFactory))?;
    registry.register(Arc::new(identity::IdentityFactory))?;
    registry.register(Arc::new(freight::FreightQuoteFactory))?;
    registry.register(Arc::new(llm::LlmActivityFactory::new()))?;
    Ok(())
}

/// A registry holding every standard activity type
pub fn standard_registry() -> Result<ActivityRegistry, RegistryError> {
    let mut registry = ActivityRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}

/// Descriptor for an instance of a fixed-schema activity type
pub(crate) fn fixed_descriptor(
    kind: ActivityKind,
    params: &ActivityParams,
) -> Result<ActivityDescriptor, ActivityError> {
    match kind {
        ActivityKind::Fixed {
            input_params,
            output_params,
        } => Ok(ActivityDescriptor::new(
            params.activity_name()?,
            input_params,
            output_params,
        )),
        ActivityKind::Customizable => Err(ActivityError::Configuration(
            "activity type has no fixed schema".to_string(),
        )),
    }
}
