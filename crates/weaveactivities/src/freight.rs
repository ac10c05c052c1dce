use crate::fixed_descriptor;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use weavecore::{Activity, ActivityDescriptor, ActivityError, Parameter, Value, ValueMap};
use weaveruntime::{ActivityFactory, ActivityKind, ActivityParams};

const DEFAULT_BASE_URL: &str = "https://api.truckquote.com/api/v1/quotes";
const API_KEY_VAR: &str = "TRUCKQUOTE_API_KEY";

fn address(name: &str) -> Parameter {
    Parameter::object(
        name,
        [
            Parameter::string("address"),
            Parameter::string("city"),
            Parameter::string("state"),
        ],
    )
}

fn quote_details() -> Parameter {
    Parameter::object(
        "quote_details",
        [
            Parameter::string("equipment_type"),
            Parameter::number("feet"),
            Parameter::number("weight_lbs"),
            Parameter::string("date"),
            address("origin"),
            address("destination"),
        ],
    )
}

/// Request a freight quote from truckquote.com
pub struct FreightQuoteActivity {
    descriptor: ActivityDescriptor,
    client: reqwest::Client,
    base_url: String,
}

impl FreightQuoteActivity {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Activity for FreightQuoteActivity {
    fn activity_type(&self) -> &str {
        "freight_quote_activity"
    }

    fn descriptor(&self) -> &ActivityDescriptor {
        &self.descriptor
    }

    async fn run(&self, inputs: ValueMap) -> Result<ValueMap, ActivityError> {
        let details = inputs
            .get("quote_details")
            .and_then(Value::as_object)
            .ok_or_else(|| ActivityError::MissingInputParameter("quote_details".to_string()))?;
        let request = build_quote_request(details)?;

        let token = std::env::var(API_KEY_VAR)
            .map_err(|_| ActivityError::Configuration(format!("{} is not set", API_KEY_VAR)))?;

        tracing::info!("POST {}", self.base_url);

        let response = self
            .client
            .post(&self.base_url)
            .header(reqwest::header::AUTHORIZATION, token)
            .json(&request)
            .send()
            .await
            .map_err(|e| ActivityError::ExecutionFailed(format!("Quote request failed: {}", e)))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ActivityError::ExecutionFailed(format!("Failed to read quote: {}", e)))?;
        tracing::debug!("Quote response status: {}", status);

        let response_json = serde_json::to_string_pretty(&body)
            .map_err(|e| ActivityError::ExecutionFailed(e.to_string()))?;

        Ok(HashMap::from([(
            "response_json".to_string(),
            Value::String(response_json),
        )]))
    }
}

/// Translate validated `quote_details` into the quote API request body.
///
/// The API weighs in `lbs` and takes origin and destination as two stops.
pub fn build_quote_request(
    details: &HashMap<String, Value>,
) -> Result<serde_json::Value, ActivityError> {
    type Field = Result<serde_json::Value, ActivityError>;
    let field = |map: &HashMap<String, Value>, name: &str| -> Field {
        map.get(name)
            .cloned()
            .map(serde_json::Value::from)
            .ok_or_else(|| {
                ActivityError::ExecutionFailed(format!("quote_details is missing '{}'", name))
            })
    };
    let stop = |name: &str| -> Field {
        let place = details.get(name).and_then(Value::as_object).ok_or_else(|| {
            ActivityError::ExecutionFailed(format!("quote_details is missing '{}'", name))
        })?;
        Ok(json!({
            "address": field(place, "address")?,
            "city": field(place, "city")?,
            "state": field(place, "state")?,
        }))
    };

    Ok(json!({
        "equipment_type": field(details, "equipment_type")?,
        "feet": field(details, "feet")?,
        "weight": field(details, "weight_lbs")?,
        "weight_unit": "lbs",
        "date": field(details, "date")?,
        "stops": [stop("origin")?, stop("destination")?],
    }))
}

pub struct FreightQuoteFactory;

impl ActivityFactory for FreightQuoteFactory {
    fn activity_type(&self) -> &str {
        "freight_quote_activity"
    }

    fn description(&self) -> &str {
        "Calculates a freight quote from quote details, by https://truckquote.com/"
    }

    fn kind(&self) -> ActivityKind {
        ActivityKind::fixed([quote_details()], [Parameter::string("response_json")])
    }

    fn create(&self, params: ActivityParams) -> Result<Arc<dyn Activity>, ActivityError> {
        let base_url = params.get_str("base_url").unwrap_or(DEFAULT_BASE_URL);
        Ok(Arc::new(FreightQuoteActivity {
            descriptor: fixed_descriptor(self.kind(), &params)?,
            client: reqwest::Client::new(),
            base_url: base_url.to_string(),
        }))
    }
}
