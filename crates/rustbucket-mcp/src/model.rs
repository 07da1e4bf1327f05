//! Protocol model types for the `2024-11-05` tool-server wire.
//!
//! These are the payloads that ride inside JSON-RPC `result` fields:
//! the `initialize` handshake, tool discovery and invocation, and the
//! resource surface. Field names follow the wire's camelCase convention.
//!
//! Tool results are flattened to text content blocks: structured payloads
//! travel as compact JSON text and binary payloads as the JSON form of
//! [`EncodedObject`], which [`ToolOutcome::from`] recovers on the client
//! side.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rustbucket_core::{EncodedObject, ToolDescriptor, ToolOutcome, ToolPayload};

/// Protocol revision spoken by both ends.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Identity advertised during `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// Server name.
    pub name: String,
    /// Server version.
    pub version: String,
}

/// Tool-surface capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether the tool list can change mid-session. Always false here.
    #[serde(default)]
    pub list_changed: bool,
}

/// Resource-surface capability flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    /// Whether resource subscriptions are supported. Always false here.
    #[serde(default)]
    pub subscribe: bool,
    /// Whether the resource list can change mid-session. Always false here.
    #[serde(default)]
    pub list_changed: bool,
}

/// Capability set advertised during `initialize`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Present when the server exposes tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    /// Present when the server exposes resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
}

impl ServerCapabilities {
    /// Capabilities for a server exposing both tools and resources.
    #[must_use]
    pub fn tools_and_resources() -> Self {
        Self {
            tools: Some(ToolsCapability::default()),
            resources: Some(ResourcesCapability::default()),
        }
    }
}

/// Result of the `initialize` handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol revision the server speaks.
    pub protocol_version: String,
    /// Advertised capabilities.
    pub capabilities: ServerCapabilities,
    /// Server identity.
    pub server_info: ServerInfo,
    /// Free-form usage hint shown to callers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// One tool as listed by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    /// Tool name used in `tools/call`.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema for the tool's arguments object.
    pub input_schema: Value,
}

impl From<&ToolDescriptor> for ToolInfo {
    fn from(descriptor: &ToolDescriptor) -> Self {
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            input_schema: descriptor.input_schema(),
        }
    }
}

/// Result of `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// All registered tools, in registration order.
    pub tools: Vec<ToolInfo>,
}

/// One block of tool-result content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// A text block.
    Text {
        /// The text payload.
        text: String,
    },
}

impl ContentBlock {
    /// Build a text block.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// Result of `tools/call`.
///
/// Tool failures set `isError` and carry the failure message as text;
/// they are never JSON-RPC errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Result content blocks.
    pub content: Vec<ContentBlock>,
    /// Whether the call failed inside the tool.
    #[serde(default)]
    pub is_error: bool,
}

impl From<ToolOutcome> for CallToolResult {
    fn from(outcome: ToolOutcome) -> Self {
        match outcome {
            ToolOutcome::Success(ToolPayload::Text(text)) => Self {
                content: vec![ContentBlock::text(text)],
                is_error: false,
            },
            ToolOutcome::Success(ToolPayload::Structured(value)) => Self {
                content: vec![ContentBlock::text(value.to_string())],
                is_error: false,
            },
            ToolOutcome::Success(ToolPayload::Binary(object)) => {
                let text = serde_json::to_value(&object)
                    .unwrap_or(Value::Null)
                    .to_string();
                Self {
                    content: vec![ContentBlock::text(text)],
                    is_error: false,
                }
            }
            ToolOutcome::Failure(message) => Self {
                content: vec![ContentBlock::text(message)],
                is_error: true,
            },
        }
    }
}

impl From<CallToolResult> for ToolOutcome {
    fn from(result: CallToolResult) -> Self {
        let text = result
            .content
            .iter()
            .map(|ContentBlock::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        if result.is_error {
            return Self::Failure(text);
        }
        if let Ok(object) = serde_json::from_str::<EncodedObject>(&text) {
            return Self::Success(ToolPayload::Binary(object));
        }
        match serde_json::from_str::<Value>(&text) {
            Ok(value @ (Value::Object(_) | Value::Array(_))) => {
                Self::Success(ToolPayload::Structured(value))
            }
            _ => Self::Success(ToolPayload::Text(text)),
        }
    }
}

/// One concrete resource as listed by `resources/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    /// Resource URI.
    pub uri: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Mime type, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Result of `resources/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResourcesResult {
    /// Concrete resources. Empty here: objects are reached via templates.
    pub resources: Vec<Resource>,
}

/// One URI template as listed by `resources/templates/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplate {
    /// URI template with `{placeholder}` segments.
    pub uri_template: String,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Mime type, when uniform across the template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Result of `resources/templates/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResourceTemplatesResult {
    /// Advertised templates.
    pub resource_templates: Vec<ResourceTemplate>,
}

/// One resource payload inside a `resources/read` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// URI that was read.
    pub uri: String,
    /// Mime type of the payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Text payload: decoded UTF-8, or base64 text for binary objects.
    pub text: String,
}

/// Result of `resources/read`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    /// The payloads for the requested URI.
    pub contents: Vec<ResourceContents>,
}
