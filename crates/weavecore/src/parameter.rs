//! Typed parameter schemas
//!
//! A [`Parameter`] describes one named slot of an activity interface. Its
//! [`ParamType`] is recursive: arrays may type their items and objects may
//! type their properties. On the wire a parameter is the JSON-schema-like
//! structure `{name, type, items?, properties?}`.

use crate::{SchemaError, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Parameters keyed by name
pub type ParamMap = BTreeMap<String, Parameter>;

/// Top-level type tag of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    Array,
    Object,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
            ParamKind::Array => "array",
            ParamKind::Object => "object",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKind {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(ParamKind::String),
            "number" => Ok(ParamKind::Number),
            "integer" => Ok(ParamKind::Integer),
            "boolean" => Ok(ParamKind::Boolean),
            "array" => Ok(ParamKind::Array),
            "object" => Ok(ParamKind::Object),
            other => Err(SchemaError::InvalidParameterKind(other.to_string())),
        }
    }
}

/// Full type of a parameter, including nested item/property typing.
///
/// `None` for `items`/`properties` means the array or object is untyped.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array { items: Option<Box<Parameter>> },
    Object { properties: Option<ParamMap> },
}

impl ParamType {
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamType::String => ParamKind::String,
            ParamType::Number => ParamKind::Number,
            ParamType::Integer => ParamKind::Integer,
            ParamType::Boolean => ParamKind::Boolean,
            ParamType::Array { .. } => ParamKind::Array,
            ParamType::Object { .. } => ParamKind::Object,
        }
    }
}

/// A named, typed slot in an activity interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameter", into = "RawParameter")]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Number)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Integer)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Boolean)
    }

    /// Array whose elements must all match `items`
    pub fn array(name: impl Into<String>, items: Parameter) -> Self {
        Self::new(
            name,
            ParamType::Array {
                items: Some(Box::new(items)),
            },
        )
    }

    pub fn untyped_array(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Array { items: None })
    }

    /// Object that must carry every one of `properties`
    pub fn object<I>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = Parameter>,
    {
        Self::new(
            name,
            ParamType::Object {
                properties: Some(param_map(properties)),
            },
        )
    }

    pub fn untyped_object(name: impl Into<String>) -> Self {
        Self::new(name, ParamType::Object { properties: None })
    }

    pub fn kind(&self) -> ParamKind {
        self.ty.kind()
    }

    /// Check whether `value` structurally matches this parameter.
    ///
    /// `number` accepts integers. Objects must carry every declared
    /// property; undeclared extra keys are tolerated.
    pub fn validate_value(&self, value: &Value) -> bool {
        match (&self.ty, value) {
            (ParamType::String, Value::String(_)) => true,
            (ParamType::Number, Value::Number(_) | Value::Integer(_)) => true,
            (ParamType::Integer, Value::Integer(_)) => true,
            (ParamType::Boolean, Value::Bool(_)) => true,
            (ParamType::Array { items }, Value::Array(elements)) => match items {
                Some(item) => elements.iter().all(|e| item.validate_value(e)),
                None => true,
            },
            (ParamType::Object { properties }, Value::Object(fields)) => match properties {
                Some(props) => props.iter().all(|(name, prop)| {
                    fields
                        .get(name)
                        .is_some_and(|field| prop.validate_value(field))
                }),
                None => true,
            },
            _ => false,
        }
    }

    /// Human-readable type, e.g. `array of string`
    pub fn describe(&self) -> String {
        match &self.ty {
            ParamType::Array { items: Some(item) } => format!("array of {}", item.describe()),
            ParamType::Object {
                properties: Some(props),
            } => {
                let fields: Vec<String> = props
                    .iter()
                    .map(|(name, p)| format!("{}: {}", name, p.describe()))
                    .collect();
                format!("object with properties ({})", fields.join(", "))
            }
            other => other.kind().to_string(),
        }
    }
}

/// Parse a JSON map of parameter schemas.
///
/// Entries without a `name` take their map key as name.
pub fn parse_param_map(json: &serde_json::Value) -> Result<ParamMap, SchemaError> {
    let raw: BTreeMap<String, RawParameter> = serde_json::from_value(json.clone())
        .map_err(|e| SchemaError::Malformed(e.to_string()))?;
    raw.into_iter()
        .map(|(key, mut param)| {
            if param.name.is_empty() {
                param.name = key.clone();
            }
            Ok((key, Parameter::try_from(param)?))
        })
        .collect()
}

/// Build a [`ParamMap`] keyed by each parameter's own name.
pub fn param_map<I>(params: I) -> ParamMap
where
    I: IntoIterator<Item = Parameter>,
{
    params.into_iter().map(|p| (p.name.clone(), p)).collect()
}

/// Wire shape of a parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParameter {
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Box<RawParameter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    properties: Option<BTreeMap<String, RawParameter>>,
}

impl TryFrom<RawParameter> for Parameter {
    type Error = SchemaError;

    fn try_from(raw: RawParameter) -> Result<Self, Self::Error> {
        let kind: ParamKind = raw.kind.parse()?;

        if raw.items.is_some() && kind != ParamKind::Array {
            return Err(SchemaError::MisplacedField {
                name: raw.name,
                kind: kind.to_string(),
                field: "items",
            });
        }
        if raw.properties.is_some() && kind != ParamKind::Object {
            return Err(SchemaError::MisplacedField {
                name: raw.name,
                kind: kind.to_string(),
                field: "properties",
            });
        }

        let ty = match kind {
            ParamKind::String => ParamType::String,
            ParamKind::Number => ParamType::Number,
            ParamKind::Integer => ParamType::Integer,
            ParamKind::Boolean => ParamType::Boolean,
            ParamKind::Array => ParamType::Array {
                items: raw
                    .items
                    .map(|item| Parameter::try_from(*item).map(Box::new))
                    .transpose()?,
            },
            ParamKind::Object => ParamType::Object {
                properties: raw
                    .properties
                    .map(|props| {
                        props
                            .into_iter()
                            .map(|(k, mut v)| {
                                if v.name.is_empty() {
                                    v.name = k.clone();
                                }
                                Ok((k, Parameter::try_from(v)?))
                            })
                            .collect::<Result<ParamMap, SchemaError>>()
                    })
                    .transpose()?,
            },
        };

        Ok(Parameter { name: raw.name, ty })
    }
}

impl From<Parameter> for RawParameter {
    fn from(param: Parameter) -> Self {
        let kind = param.kind().to_string();
        let (items, properties) = match param.ty {
            ParamType::Array { items } => (items.map(|i| Box::new(RawParameter::from(*i))), None),
            ParamType::Object { properties } => (
                None,
                properties.map(|props| {
                    props
                        .into_iter()
                        .map(|(k, v)| (k, RawParameter::from(v)))
                        .collect()
                }),
            ),
            _ => (None, None),
        };
        RawParameter {
            name: param.name,
            kind,
            items,
            properties,
        }
    }
}
