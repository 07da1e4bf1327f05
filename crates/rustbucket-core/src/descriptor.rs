//! Tool contracts: declared names, parameters, and their wire schema.
//!
//! A [`ToolDescriptor`] is built once at startup, registered together with
//! its handler, and never mutated afterwards. The descriptor drives both
//! argument validation in the dispatcher and the JSON Schema published to
//! clients through tool discovery.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// JSON types a tool parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// A JSON string.
    String,
    /// A JSON boolean.
    Boolean,
    /// A JSON integer (no fractional part).
    Integer,
}

impl ParamKind {
    /// The JSON Schema type name for this kind.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
        }
    }

    /// Whether a JSON value inhabits this kind.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single declared tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParam {
    /// Argument name as it appears in call requests.
    pub name: String,
    /// Declared JSON type.
    pub kind: ParamKind,
    /// Whether the argument must be supplied by the caller.
    pub required: bool,
    /// Value merged in when an optional argument is omitted.
    pub default: Option<Value>,
    /// Human-readable description published in the schema.
    pub description: String,
}

impl ToolParam {
    /// Declare a required parameter.
    #[must_use]
    pub fn required(name: &str, kind: ParamKind, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            required: true,
            default: None,
            description: description.to_owned(),
        }
    }

    /// Declare an optional parameter with a default value.
    ///
    /// The default is merged into the argument map when the caller omits
    /// the argument, so handlers always see a value for it.
    #[must_use]
    pub fn optional(name: &str, kind: ParamKind, default: Value, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind,
            required: false,
            default: Some(default),
            description: description.to_owned(),
        }
    }
}

/// The declared contract of a registered tool.
///
/// # Examples
///
/// ```
/// use rustbucket_core::{ParamKind, ToolDescriptor, ToolParam};
///
/// let descriptor = ToolDescriptor::new("GetObject", "Retrieve an object from S3")
///     .with_param(ToolParam::required("bucket", ParamKind::String, "Bucket name"))
///     .with_param(ToolParam::required("key", ParamKind::String, "Object key"));
///
/// let schema = descriptor.input_schema();
/// assert_eq!(schema["type"], "object");
/// assert_eq!(schema["required"][0], "bucket");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name as clients invoke it.
    pub name: String,
    /// Human-readable description published in tool discovery.
    pub description: String,
    /// Declared parameters, in schema order.
    pub params: Vec<ToolParam>,
}

impl ToolDescriptor {
    /// Create a descriptor with no parameters.
    #[must_use]
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_owned(),
            description: description.to_owned(),
            params: Vec::new(),
        }
    }

    /// Append a declared parameter.
    #[must_use]
    pub fn with_param(mut self, param: ToolParam) -> Self {
        self.params.push(param);
        self
    }

    /// Look up a declared parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ToolParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render the JSON Schema object published for this tool.
    ///
    /// Produces `{"type": "object", "properties": {...}, "required": [...]}`
    /// with one property per declared parameter; defaults are included so
    /// clients can surface them.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            let mut property = serde_json::Map::new();
            property.insert("type".to_owned(), json!(param.kind.as_str()));
            property.insert("description".to_owned(), json!(param.description));
            if let Some(default) = &param.default {
                property.insert("default".to_owned(), default.clone());
            }
            properties.insert(param.name.clone(), Value::Object(property));

            if param.required {
                required.push(json!(param.name));
            }
        }

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
