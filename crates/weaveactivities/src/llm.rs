//! LLM-backed activity
//!
//! The system prompt is the configured system message followed by the JSON
//! structure of the declared outputs. Inputs go out as a JSON object; the
//! reply must be a JSON object carrying every declared output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use weavecore::{
    param_map, Activity, ActivityDescriptor, ActivityError, ParamMap, Parameter, Value, ValueMap,
};
use weaveruntime::{ActivityFactory, ActivityKind, ActivityParams};

pub const SUPPORTED_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini"];

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Model selection and sampling settings for one activity instance
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    pub model_name: String,
    pub temperature: f64,
    pub top_p: f64,
    pub api_base: String,
}

impl LlmConfig {
    pub fn new(model_name: impl Into<String>, temperature: f64, top_p: f64) -> Self {
        Self {
            model_name: model_name.into(),
            temperature,
            top_p,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    fn check_model(&self) -> Result<(), ActivityError> {
        if SUPPORTED_MODELS.contains(&self.model_name.as_str()) {
            Ok(())
        } else {
            Err(ActivityError::Configuration(format!(
                "Unsupported model: {}",
                self.model_name
            )))
        }
    }
}

/// Chat completion provider
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        config: &LlmConfig,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, ActivityError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f64,
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// OpenAI-compatible `chat/completions` client
#[derive(Clone)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: Option<String>,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Some(api_key.into()),
        }
    }

    /// Key from `OPENAI_API_KEY`; a missing key fails at call time
    pub fn from_env() -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: std::env::var(API_KEY_VAR).ok(),
        }
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(
        &self,
        config: &LlmConfig,
        system_message: &str,
        user_message: &str,
    ) -> Result<String, ActivityError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ActivityError::Configuration(format!("{} is not set", API_KEY_VAR)))?;

        let request = ChatRequest {
            model: &config.model_name,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_message,
                },
                ChatMessage {
                    role: "user",
                    content: user_message,
                },
            ],
            temperature: config.temperature,
            top_p: config.top_p,
        };
        let url = format!("{}/chat/completions", config.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ActivityError::ExecutionFailed(format!("LLM request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| ActivityError::ExecutionFailed(format!("LLM request failed: {}", e)))?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ActivityError::ExecutionFailed(format!("Invalid LLM response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ActivityError::ExecutionFailed("LLM returned no content".to_string()))
    }
}

/// JSON skeleton of the declared outputs, one `"name": <type>` line each
pub fn output_structure(output_params: &ParamMap) -> String {
    let fields: Vec<String> = output_params
        .iter()
        .map(|(name, param)| format!("    \"{}\": <{}>", name, param.kind()))
        .collect();
    format!("{{\n{}\n}}", fields.join(",\n"))
}

/// Pick exactly the declared outputs out of a JSON reply.
///
/// A surrounding markdown code fence is tolerated; keys that are not
/// declared outputs are dropped.
pub fn parse_reply(output_params: &ParamMap, reply: &str) -> Result<ValueMap, ActivityError> {
    let body = strip_code_fence(reply);
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ActivityError::ExecutionFailed(format!("Invalid JSON response: {}", e)))?;
    let serde_json::Value::Object(mut fields) = parsed else {
        return Err(ActivityError::ExecutionFailed(
            "Invalid JSON response: expected an object".to_string(),
        ));
    };

    output_params
        .keys()
        .map(|name| {
            fields
                .remove(name)
                .map(|value| (name.clone(), Value::from(value)))
                .ok_or_else(|| ActivityError::MissingOutputParameter(name.clone()))
        })
        .collect()
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    match trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
    {
        Some(inner) => inner.trim_start_matches("json").trim(),
        None => trimmed,
    }
}

/// Activity whose outputs are produced by a language model
pub struct LlmActivity {
    descriptor: ActivityDescriptor,
    system_message: String,
    config: LlmConfig,
    backend: Arc<dyn CompletionBackend>,
}

impl LlmActivity {
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Configured system message plus the required output format
    pub fn system_prompt(&self) -> String {
        format!(
            "{}\n\nOUTPUT FORMAT\n\
             ONLY return a JSON object with the following structure\n\
             double check if the JSON is valid especially for escape characters\n\
             No other explanations needed\n\n{}",
            self.system_message,
            output_structure(&self.descriptor.output_params)
        )
    }
}

#[async_trait]
impl Activity for LlmActivity {
    fn activity_type(&self) -> &str {
        "llm_activity"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let user_message = serde_json::Value::from(Value::Object(inputs)).to_string();

        tracing::debug!(
            "Calling {} for activity '{}'",
            self.config.model_name,
            self.descriptor.activity_name
        );
        let reply = self
            .backend
            .complete(&self.config, &self.system_prompt(), &user_message)
            .await?;

        parse_reply(&self.descriptor.output_params, &reply)
    }
}

/// Factory for `llm_activity`; every instance shares one backend
pub struct LlmActivityFactory {
    backend: Arc<dyn CompletionBackend>,
}

impl LlmActivityFactory {
    /// OpenAI backend keyed from the environment
    pub fn new() -> Self {
        Self::with_backend(Arc::new(OpenAiBackend::from_env()))
    }

    pub fn with_backend(backend: Arc<dyn CompletionBackend>) -> Self {
        Self { backend }
    }
}

impl Default for LlmActivityFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivityFactory for LlmActivityFactory {
    fn activity_type(&self) -> &str {
        "llm_activity"
    }

    fn description(&self) -> &str {
        "Produces its outputs with a large language model"
    }

    fn required_params(&self) -> ParamMap {
        param_map([
            Parameter::string("activity_name"),
            Parameter::string("system_message"),
            Parameter::string("model_name"),
            Parameter::number("temperature"),
            Parameter::number("top_p"),
        ])
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::Customizable
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        let (input_params, output_params) = params.custom_schema()?;

        let mut config = LlmConfig::new(
            params.require_str("model_name")?,
            params.require_f64("temperature")?,
            params.require_f64("top_p")?,
        );
        if let Some(api_base) = params.get_str("api_base") {
            config.api_base = api_base.to_string();
        }
        config.check_model()?;

        Ok(Arc::new(LlmActivity {
            descriptor: ActivityDescriptor::new(
                params.activity_name()?,
                input_params,
                output_params,
            ),
            system_message: params.require_str("system_message")?.to_string(),
            config,
            backend: Arc::clone(&self.backend),
        }))
    }
}

impl std::fmt::Debug for LlmActivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmActivity")
            .field("activity_name", &self.descriptor.activity_name)
            .field("config", &self.config)
            .finish()
    }
}

